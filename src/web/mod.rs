pub mod account;
pub mod admin;
pub mod car;
pub mod error;
pub mod index;

use actix_web::error::{self as http_error, InternalError};
use actix_web::{Error, HttpResponse};
use sea_orm::DbErr;

/// Configures the server-rendered site.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(crate::frontend::css::view_css);
    index::configure(conf);
    car::configure(conf);
    account::configure(conf);
    admin::configure(conf);
}

/// Logs a database failure and turns it into a 500 page.
pub(crate) fn db_error(e: DbErr) -> Error {
    log::error!("database failure: {}", e);
    http_error::ErrorInternalServerError(e)
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", location))
        .finish()
}

/// Sends a guest to the login form, returning to `next` afterwards.
pub(crate) fn login_redirect(next: &str) -> Error {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    InternalError::from_response(
        "Login required.",
        redirect(&format!("/auth/login/?{}", query)),
    )
    .into()
}

/// Accepts only local absolute paths as a post-login destination.
pub(crate) fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}
