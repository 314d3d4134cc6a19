use super::error::ApiError;
use super::not_allowed;
use super::payload::parse_payload;
use crate::auth::authenticate;
use crate::auth::jwt::{JwtKeys, TokenPair};
use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(
        web::resource("/auth/jwt/create/")
            .route(web::post().to(create_token))
            .default_service(not_allowed("POST")),
    )
    .service(
        web::resource("/auth/jwt/refresh/")
            .route(web::post().to(refresh_token))
            .default_service(not_allowed("POST")),
    )
    .service(
        web::resource("/auth/jwt/verify/")
            .route(web::post().to(verify_token))
            .default_service(not_allowed("POST")),
    );
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenObtainRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenVerifyRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: pair.refresh,
        }
    }
}

/// Collects `field: ["required"]` errors for every absent or blank field.
fn require_fields(fields: &[(&'static str, &Option<String>)]) -> Result<(), ApiError> {
    use crate::validators::{ValidationError, ValidationErrors};

    let mut errors = ValidationErrors::new();
    for &(name, value) in fields {
        match value.as_deref() {
            None => errors.add(name, ValidationError::required()),
            Some(v) if v.trim().is_empty() => errors.add(name, ValidationError::blank()),
            Some(_) => {}
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/jwt/create/",
    tag = "auth",
    request_body = TokenObtainRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenPairResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "No active account with these credentials")
    )
)]
pub async fn create_token(
    req: HttpRequest,
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse, ApiError> {
    let form = parse_payload::<TokenObtainRequest>(&req, &body)?;
    require_fields(&[("username", &form.username), ("password", &form.password)])?;

    let username = form.username.as_deref().unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();
    let user = authenticate(db.get_ref(), username, password)
        .await?
        .ok_or_else(|| {
            ApiError::NotAuthenticated("No active account found with the given credentials".to_owned())
        })?;

    let pair = keys.issue_pair(user.id)?;
    log::info!("create_token: issued tokens for {}", user.username);
    Ok(HttpResponse::Ok().json(TokenPairResponse::from(pair)))
}

#[utoipa::path(
    post,
    path = "/api/auth/jwt/refresh/",
    tag = "auth",
    request_body = TokenRefreshRequest,
    responses(
        (status = 200, description = "A new access token", body = AccessTokenResponse),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Refresh token invalid or expired")
    )
)]
pub async fn refresh_token(
    req: HttpRequest,
    body: web::Bytes,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse, ApiError> {
    let form = parse_payload::<TokenRefreshRequest>(&req, &body)?;
    require_fields(&[("refresh", &form.refresh)])?;

    let (_, access) = keys.refresh(form.refresh.as_deref().unwrap_or_default())?;
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access }))
}

#[utoipa::path(
    post,
    path = "/api/auth/jwt/verify/",
    tag = "auth",
    request_body = TokenVerifyRequest,
    responses(
        (status = 200, description = "The token is valid"),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Token invalid or expired")
    )
)]
pub async fn verify_token(
    req: HttpRequest,
    body: web::Bytes,
    keys: web::Data<JwtKeys>,
) -> Result<HttpResponse, ApiError> {
    let form = parse_payload::<TokenVerifyRequest>(&req, &body)?;
    require_fields(&[("token", &form.token)])?;

    keys.verify(form.token.as_deref().unwrap_or_default())?;
    Ok(HttpResponse::Ok().json(json!({})))
}
