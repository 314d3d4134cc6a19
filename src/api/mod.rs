//! The JSON API mounted under `/api`.
//!
//! Handlers return `Result<HttpResponse, ApiError>` so that every failure is
//! rendered as JSON, independent of the HTML error pages of the site.

pub mod auth;
pub mod cars;
pub mod comments;
pub mod docs;
pub mod error;
pub mod pagination;
pub mod payload;

use crate::middleware::ClientCtx;
use crate::user::ClientUser;
use actix_web::{web, HttpRequest, Route, Scope};
use error::ApiError;

/// Mounts the API resources on `scope`, which should be `/api`.
pub fn scope(scope: Scope) -> Scope {
    scope
        .app_data(web::PathConfig::default().error_handler(|_, _| ApiError::NotFound.into()))
        .configure(cars::configure)
        .configure(comments::configure)
        .configure(auth::configure)
        .default_service(web::route().to(not_found))
}

/// The authenticated client of an API request.
/// A bearer token that failed to verify is an error here, unlike on the site.
pub(crate) fn api_client(client: &ClientCtx) -> Result<Option<ClientUser>, ApiError> {
    if client.has_token_error() {
        Err(ApiError::invalid_token())
    } else {
        Ok(client.get_user())
    }
}

/// Fallback for methods a resource does not route.
pub(crate) fn not_allowed(allow: &'static str) -> Route {
    web::route().to(move |req: HttpRequest| async move {
        Err::<actix_web::HttpResponse, _>(ApiError::MethodNotAllowed {
            method: req.method().to_owned(),
            allow,
        })
    })
}

async fn not_found() -> Result<actix_web::HttpResponse, ApiError> {
    Err(ApiError::NotFound)
}
