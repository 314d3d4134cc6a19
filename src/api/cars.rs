use super::error::ApiError;
use super::pagination::{paginate, CarPage, PageQuery};
use super::payload::parse_payload;
use super::{api_client, not_allowed};
use crate::car::{self, CarPayload, NewCar};
use crate::config::Config;
use crate::middleware::ClientCtx;
use crate::orm::cars;
use crate::permission::{owner_or_staff, OwnershipPolicy};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

const POLICY: OwnershipPolicy<cars::Model> = owner_or_staff();

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(
        web::resource("/cars/")
            .route(web::get().to(list_cars))
            .route(web::post().to(create_car))
            .default_service(not_allowed("GET, POST")),
    )
    .service(
        web::resource("/cars/{id}/")
            .route(web::get().to(retrieve_car))
            .route(web::put().to(update_car))
            .route(web::delete().to(destroy_car))
            .default_service(not_allowed("GET, PUT, DELETE")),
    );
}

/// A car as the API shows it.
#[derive(Debug, Serialize, ToSchema)]
pub struct CarResponse {
    pub id: i32,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Id of the owning user. Read only.
    pub owner: i32,
}

impl From<cars::Model> for CarResponse {
    fn from(car: cars::Model) -> Self {
        Self {
            id: car.id,
            make: car.make,
            model: car.model,
            year: car.year,
            description: car.description,
            created_at: car.created_at,
            updated_at: car.updated_at,
            owner: car.owner_id,
        }
    }
}

async fn find_car(db: &DatabaseConnection, id: i32) -> Result<cars::Model, ApiError> {
    car::get_car(db, id).await?.ok_or(ApiError::NotFound)
}

#[utoipa::path(
    get,
    path = "/api/cars/",
    tag = "cars",
    params(PageQuery),
    responses(
        (status = 200, description = "A page of cars, newest first", body = CarPage),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_cars(
    client: ClientCtx,
    req: HttpRequest,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    api_client(&client)?;
    let page = paginate(
        db.get_ref(),
        &req,
        &query,
        config.page_size,
        car::select_cars(),
        CarResponse::from,
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    post,
    path = "/api/cars/",
    tag = "cars",
    request_body = CarPayload,
    responses(
        (status = 201, description = "Car created and owned by the caller", body = CarResponse),
        (status = 400, description = "Invalid fields"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn create_car(
    client: ClientCtx,
    req: HttpRequest,
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = api_client(&client)?;
    POLICY.has_permission(user.as_ref(), req.method())?;
    let user = user.ok_or_else(ApiError::not_authenticated)?;

    let fields = parse_payload::<CarPayload>(&req, &body)?.validate()?;
    let car = car::create_car(
        db.get_ref(),
        NewCar {
            fields,
            owner_id: user.id,
        },
    )
    .await?;

    log::info!("create_car: {} created car {}", user.username, car.id);
    Ok(HttpResponse::Created().json(CarResponse::from(car)))
}

#[utoipa::path(
    get,
    path = "/api/cars/{id}/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car id")),
    responses(
        (status = 200, description = "The car", body = CarResponse),
        (status = 404, description = "No such car")
    )
)]
pub async fn retrieve_car(
    client: ClientCtx,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    api_client(&client)?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CarResponse::from(car)))
}

#[utoipa::path(
    put,
    path = "/api/cars/{id}/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car id")),
    request_body = CarPayload,
    responses(
        (status = 200, description = "Every editable field replaced", body = CarResponse),
        (status = 400, description = "Invalid fields"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither the owner nor staff"),
        (status = 404, description = "No such car")
    ),
    security(("bearer" = []))
)]
pub async fn update_car(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = api_client(&client)?;
    POLICY.has_permission(user.as_ref(), req.method())?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    POLICY.has_object_permission(user.as_ref(), req.method(), &car)?;

    let fields = parse_payload::<CarPayload>(&req, &body)?.validate()?;
    let car = car::update_car(db.get_ref(), car, fields).await?;
    Ok(HttpResponse::Ok().json(CarResponse::from(car)))
}

#[utoipa::path(
    delete,
    path = "/api/cars/{id}/",
    tag = "cars",
    params(("id" = i32, Path, description = "Car id")),
    responses(
        (status = 204, description = "Car and its comments deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither the owner nor staff"),
        (status = 404, description = "No such car")
    ),
    security(("bearer" = []))
)]
pub async fn destroy_car(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = api_client(&client)?;
    POLICY.has_permission(user.as_ref(), req.method())?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    POLICY.has_object_permission(user.as_ref(), req.method(), &car)?;

    car::delete_car(db.get_ref(), car.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
