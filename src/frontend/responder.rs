use actix_web::http::StatusCode;
use actix_web::{error, HttpResponse};

/// Renders an askama template straight into an actix-web response.
pub trait TemplateToResponse {
    fn to_response(&self) -> HttpResponse;
    fn to_response_with_status(&self, status: StatusCode) -> HttpResponse;
}

impl<T: askama::Template> TemplateToResponse for T {
    fn to_response(&self) -> HttpResponse {
        self.to_response_with_status(StatusCode::OK)
    }

    fn to_response_with_status(&self, status: StatusCode) -> HttpResponse {
        let mut buffer = String::with_capacity(4096); // allocate 4KB up front for performance
        if let Err(e) = self.render_into(&mut buffer) {
            log::error!("TemplateToResponse: {}", e);
            return error::ErrorInternalServerError("Template parsing error").error_response();
        }

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(buffer)
    }
}
