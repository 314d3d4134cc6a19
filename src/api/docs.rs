//! OpenAPI document for the JSON API and the Swagger UI page that browses it.

use super::auth::{
    AccessTokenResponse, TokenObtainRequest, TokenPairResponse, TokenRefreshRequest,
    TokenVerifyRequest,
};
use super::cars::CarResponse;
use super::comments::CommentResponse;
use super::pagination::{CarPage, CommentPage};
use crate::car::CarPayload;
use crate::comment::CommentPayload;
use crate::frontend::TemplateToResponse;
use actix_web::{get, web, HttpResponse, Responder};
use askama::Template;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_docs_root)
        .service(view_openapi)
        .service(view_swagger);
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Automobile Portal API",
        version = "1.0.0",
        description = "Car listings with owners and comments."
    ),
    paths(
        super::cars::list_cars,
        super::cars::create_car,
        super::cars::retrieve_car,
        super::cars::update_car,
        super::cars::destroy_car,
        super::comments::list_comments,
        super::comments::create_comment,
        super::comments::retrieve_comment,
        super::auth::create_token,
        super::auth::refresh_token,
        super::auth::verify_token,
    ),
    components(schemas(
        CarPayload,
        CarResponse,
        CarPage,
        CommentPayload,
        CommentResponse,
        CommentPage,
        TokenObtainRequest,
        TokenPairResponse,
        TokenRefreshRequest,
        AccessTokenResponse,
        TokenVerifyRequest,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "cars", description = "Car listings"),
        (name = "comments", description = "Comments nested under a car"),
        (name = "auth", description = "JSON Web Tokens")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Template)]
#[template(path = "docs/swagger.html")]
struct SwaggerTemplate<'a> {
    title: &'a str,
    spec_url: &'a str,
}

#[get("/")]
async fn view_docs_root() -> impl Responder {
    HttpResponse::Found()
        .append_header(("Location", "/docs/swagger/"))
        .finish()
}

#[get("/openapi/")]
async fn view_openapi() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[get("/swagger/")]
async fn view_swagger() -> impl Responder {
    SwaggerTemplate {
        title: "Automobile Portal API",
        spec_url: "/docs/openapi/",
    }
    .to_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/cars/",
            "/api/cars/{id}/",
            "/api/cars/{car_id}/comments/",
            "/api/cars/{car_id}/comments/{id}/",
            "/api/auth/jwt/create/",
            "/api/auth/jwt/refresh/",
            "/api/auth/jwt/verify/",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{}", path);
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
        for schema in ["CarPage", "CommentPage"] {
            assert!(components.schemas.contains_key(schema), "{}", schema);
        }
    }
}
