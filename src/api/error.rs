use crate::auth::jwt::TokenError;
use crate::permission::Denial;
use crate::validators::ValidationErrors;
use actix_web::http::{header, Method, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use sea_orm::DbErr;
use serde_json::json;

/// Every way an API request can fail. Rendered as JSON.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Field level validation failures.
    #[display(fmt = "{}", _0)]
    Validation(ValidationErrors),
    /// The body could not be parsed at all.
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    NotAuthenticated(String),
    #[display(fmt = "You do not have permission to perform this action.")]
    PermissionDenied,
    #[display(fmt = "Not found.")]
    NotFound,
    #[display(fmt = "Invalid page.")]
    InvalidPage,
    #[display(fmt = "Method \"{}\" not allowed.", method)]
    MethodNotAllowed { method: Method, allow: &'static str },
    #[display(fmt = "A server error occurred.")]
    Internal,
}

impl ApiError {
    pub fn not_authenticated() -> Self {
        Self::NotAuthenticated(Denial::NotAuthenticated.to_string())
    }

    pub fn invalid_token() -> Self {
        Self::NotAuthenticated("Given token not valid for any token type".to_owned())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound | Self::InvalidPage => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        match self {
            Self::NotAuthenticated(_) => {
                res.insert_header((header::WWW_AUTHENTICATE, "Bearer realm=\"api\""));
            }
            Self::MethodNotAllowed { allow, .. } => {
                res.insert_header((header::ALLOW, *allow));
            }
            _ => {}
        }

        match self {
            Self::Validation(errors) => res.json(errors.to_json()),
            _ => res.json(json!({ "detail": self.to_string() })),
        }
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotAuthenticated => Self::not_authenticated(),
            Denial::PermissionDenied => Self::PermissionDenied,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        log::error!("ApiError: database failure: {}", e);
        Self::Internal
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encoding => Self::Internal,
            TokenError::Invalid | TokenError::WrongType => Self::NotAuthenticated(
                "Token is invalid or expired".to_owned(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidationError;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::not_authenticated().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(Denial::PermissionDenied).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(DbErr::Custom("boom".to_owned())).status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let mut errors = ValidationErrors::new();
        errors.add("make", ValidationError::blank());
        assert_eq!(ApiError::from(errors).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_and_allow_headers() {
        let res = ApiError::not_authenticated().error_response();
        assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer realm=\"api\"");

        let res = ApiError::MethodNotAllowed {
            method: Method::PATCH,
            allow: "GET, PUT, DELETE",
        }
        .error_response();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get(header::ALLOW).unwrap(), "GET, PUT, DELETE");
    }
}
