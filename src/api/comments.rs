use super::error::ApiError;
use super::pagination::{paginate, CommentPage, PageQuery};
use super::payload::parse_payload;
use super::{api_client, not_allowed};
use crate::car::get_car;
use crate::comment::{self, CommentPayload, NewComment};
use crate::config::Config;
use crate::middleware::ClientCtx;
use crate::orm::{cars, comments};
use crate::permission::{author_or_staff, OwnershipPolicy};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

const POLICY: OwnershipPolicy<comments::Model> = author_or_staff();

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(
        web::resource("/cars/{car_id}/comments/")
            .route(web::get().to(list_comments))
            .route(web::post().to(create_comment))
            .default_service(not_allowed("GET, POST")),
    )
    .service(
        web::resource("/cars/{car_id}/comments/{id}/")
            .route(web::get().to(retrieve_comment))
            .default_service(not_allowed("GET")),
    );
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
    /// Id of the car commented on. Read only.
    pub car: i32,
    /// Id of the writing user. Read only.
    pub author: i32,
}

impl From<comments::Model> for CommentResponse {
    fn from(comment: comments::Model) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            car: comment.car_id,
            author: comment.author_id,
        }
    }
}

async fn find_parent(db: &DatabaseConnection, car_id: i32) -> Result<cars::Model, ApiError> {
    get_car(db, car_id).await?.ok_or(ApiError::NotFound)
}

#[utoipa::path(
    get,
    path = "/api/cars/{car_id}/comments/",
    tag = "comments",
    params(("car_id" = i32, Path, description = "Car id"), PageQuery),
    responses(
        (status = 200, description = "A page of the car's comments, oldest first", body = CommentPage),
        (status = 404, description = "No such car, or page out of range")
    )
)]
pub async fn list_comments(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    api_client(&client)?;
    let car = find_parent(db.get_ref(), path.into_inner()).await?;
    let page = paginate(
        db.get_ref(),
        &req,
        &query,
        config.page_size,
        comment::select_thread(car.id),
        CommentResponse::from,
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/cars/{car_id}/comments/",
    tag = "comments",
    params(("car_id" = i32, Path, description = "Car id")),
    request_body = CommentPayload,
    responses(
        (status = 201, description = "Comment written by the caller", body = CommentResponse),
        (status = 400, description = "Invalid content"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such car")
    ),
    security(("bearer" = []))
)]
pub async fn create_comment(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = api_client(&client)?;
    POLICY.has_permission(user.as_ref(), req.method())?;
    let user = user.ok_or_else(ApiError::not_authenticated)?;
    let car = find_parent(db.get_ref(), path.into_inner()).await?;

    let fields = parse_payload::<CommentPayload>(&req, &body)?.validate()?;
    let comment = comment::create_comment(
        db.get_ref(),
        NewComment {
            fields,
            car_id: car.id,
            author_id: user.id,
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

#[utoipa::path(
    get,
    path = "/api/cars/{car_id}/comments/{id}/",
    tag = "comments",
    params(
        ("car_id" = i32, Path, description = "Car id"),
        ("id" = i32, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "The comment", body = CommentResponse),
        (status = 404, description = "No such car, or the comment is not under it")
    )
)]
pub async fn retrieve_comment(
    client: ClientCtx,
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    api_client(&client)?;
    let (car_id, id) = path.into_inner();
    let car = find_parent(db.get_ref(), car_id).await?;
    let comment = comment::get_comment_for_car(db.get_ref(), car.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}
