use super::error::ApiError;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::HttpRequest;
use serde::de::DeserializeOwned;

/// Parses a request body sent either as JSON or as an urlencoded form.
///
/// Form values are strings, so numeric fields must accept text. An empty body
/// parses as an empty object.
pub fn parse_payload<T: DeserializeOwned>(req: &HttpRequest, body: &[u8]) -> Result<T, ApiError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let value = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(serde_json::Map::new())
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        serde_json::Value::Object(
            url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
                .collect(),
        )
    } else if content_type.is_empty() || content_type.starts_with("application/json") {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("JSON parse error - {}", e)))?
    } else {
        return Err(ApiError::BadRequest(format!(
            "Unsupported media type \"{}\" in request.",
            content_type
        )));
    };

    if !value.is_object() {
        return Err(ApiError::BadRequest(
            "Invalid data. Expected a dictionary.".to_owned(),
        ));
    }

    serde_json::from_value(value).map_err(|e| ApiError::BadRequest(format!("Invalid data - {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarPayload;
    use crate::validators::YearInput;
    use actix_web::test::TestRequest;

    #[test]
    fn test_form_and_json_bodies() {
        let req = TestRequest::post()
            .insert_header((CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .to_http_request();
        let car: CarPayload = parse_payload(&req, b"make=Ford&year=1967").unwrap();
        assert_eq!(car.make.as_deref(), Some("Ford"));
        assert_eq!(car.year, Some(YearInput::Text("1967".to_owned())));

        let req = TestRequest::post()
            .insert_header((CONTENT_TYPE, "application/json"))
            .to_http_request();
        let car: CarPayload = parse_payload(&req, br#"{"year": 1967}"#).unwrap();
        assert_eq!(car.year, Some(YearInput::Number(1967)));
        assert!(parse_payload::<CarPayload>(&req, b"{not json").is_err());
        assert!(parse_payload::<CarPayload>(&req, b"[1, 2]").is_err());
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        let req = TestRequest::post().to_http_request();
        let car: CarPayload = parse_payload(&req, b"").unwrap();
        assert!(car.make.is_none());
    }
}
