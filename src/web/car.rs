use super::{db_error, login_redirect, redirect};
use crate::car::{
    create_car, delete_car, get_car, get_car_for_template, update_car, CarForTemplate, CarPayload,
    NewCar,
};
use crate::comment::{create_comment, get_thread_for_template, CommentForTemplate, CommentPayload, NewComment};
use crate::frontend::TemplateToResponse;
use crate::middleware::ClientCtx;
use crate::orm::cars;
use crate::session::{set_comment_flash, take_comment_flash, CommentFlash};
use crate::validators::ValidationErrors;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama::Template;
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // `/cars/create/` must be matched before `/cars/{id}/`.
    conf.service(create_car_form)
        .service(create_car_post)
        .service(view_car)
        .service(edit_car_form)
        .service(edit_car_post)
        .service(delete_car_form)
        .service(delete_car_post)
        .service(create_comment_post);
}

#[derive(Template)]
#[template(path = "car_detail.html")]
pub struct CarDetailTemplate {
    pub client: ClientCtx,
    pub car: CarForTemplate,
    pub comments: Vec<CommentForTemplate>,
    /// Draft of a rejected comment.
    pub comment_content: String,
    pub comment_errors: Vec<String>,
    pub can_update: bool,
    pub can_delete: bool,
}

#[derive(Template)]
#[template(path = "car_form.html")]
pub struct CarFormTemplate {
    pub client: ClientCtx,
    pub heading: &'static str,
    pub action: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub description: String,
    pub errors: ValidationErrors,
}

impl CarFormTemplate {
    fn new(
        client: ClientCtx,
        heading: &'static str,
        action: String,
        payload: &CarPayload,
        errors: ValidationErrors,
    ) -> Self {
        Self {
            client,
            heading,
            action,
            make: payload.make.to_owned().unwrap_or_default(),
            model: payload.model.to_owned().unwrap_or_default(),
            year: payload.year_text(),
            description: payload.description.to_owned().unwrap_or_default(),
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "car_delete.html")]
pub struct CarDeleteTemplate {
    pub client: ClientCtx,
    pub car: cars::Model,
}

async fn find_car(db: &DatabaseConnection, id: i32) -> Result<cars::Model, Error> {
    get_car(db, id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Car not found."))
}

#[get("/cars/create/")]
async fn create_car_form(client: ClientCtx) -> Result<impl Responder, Error> {
    if !client.is_user() {
        return Err(login_redirect("/cars/create/"));
    }

    Ok(CarFormTemplate::new(
        client,
        "Добавить автомобиль",
        "/cars/create/".to_owned(),
        &CarPayload::default(),
        ValidationErrors::new(),
    )
    .to_response())
}

#[post("/cars/create/")]
async fn create_car_post(
    client: ClientCtx,
    form: web::Form<CarPayload>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let owner_id = client
        .get_id()
        .ok_or_else(|| login_redirect("/cars/create/"))?;

    match form.validate() {
        Ok(fields) => {
            create_car(db.get_ref(), NewCar { fields, owner_id })
                .await
                .map_err(db_error)?;
            Ok(redirect("/"))
        }
        Err(errors) => Ok(CarFormTemplate::new(
            client,
            "Добавить автомобиль",
            "/cars/create/".to_owned(),
            &form,
            errors,
        )
        .to_response()),
    }
}

#[get("/cars/{id}/")]
async fn view_car(
    client: ClientCtx,
    path: web::Path<i32>,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let car = get_car_for_template(db.get_ref(), path.into_inner())
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Car not found."))?;
    let comments = get_thread_for_template(db.get_ref(), car.id)
        .await
        .map_err(db_error)?;
    let flash = take_comment_flash(&session, car.id).unwrap_or_default();

    Ok(CarDetailTemplate {
        can_update: client.can_update_car(car.owner_id),
        can_delete: client.can_delete_car(car.owner_id),
        client,
        car,
        comments,
        comment_content: flash.content,
        comment_errors: flash.errors,
    }
    .to_response())
}

#[get("/cars/{id}/edit/")]
async fn edit_car_form(
    client: ClientCtx,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    if !client.can_update_car(car.owner_id) {
        return Ok(redirect(&format!("/cars/{}/", car.id)));
    }

    Ok(CarFormTemplate::new(
        client,
        "Редактировать автомобиль",
        format!("/cars/{}/edit/", car.id),
        &CarPayload::from(&car),
        ValidationErrors::new(),
    )
    .to_response())
}

#[post("/cars/{id}/edit/")]
async fn edit_car_post(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<CarPayload>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    if !client.can_update_car(car.owner_id) {
        return Ok(redirect(&format!("/cars/{}/", car.id)));
    }

    match form.validate() {
        Ok(fields) => {
            update_car(db.get_ref(), car, fields)
                .await
                .map_err(db_error)?;
            Ok(redirect("/"))
        }
        Err(errors) => Ok(CarFormTemplate::new(
            client,
            "Редактировать автомобиль",
            format!("/cars/{}/edit/", car.id),
            &form,
            errors,
        )
        .to_response()),
    }
}

#[get("/cars/{id}/delete/")]
async fn delete_car_form(
    client: ClientCtx,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    if !client.can_delete_car(car.owner_id) {
        return Ok(redirect(&format!("/cars/{}/", car.id)));
    }

    Ok(CarDeleteTemplate { client, car }.to_response())
}

#[post("/cars/{id}/delete/")]
async fn delete_car_post(
    client: ClientCtx,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    if !client.can_delete_car(car.owner_id) {
        return Ok(redirect(&format!("/cars/{}/", car.id)));
    }

    delete_car(db.get_ref(), car.id).await.map_err(db_error)?;
    log::info!("delete_car_post: {} deleted car {}", client.get_name(), car.id);
    Ok(redirect("/"))
}

#[post("/cars/{id}/comment/")]
async fn create_comment_post(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<CommentPayload>,
    session: Session,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let car_id = path.into_inner();
    let author_id = client
        .get_id()
        .ok_or_else(|| login_redirect(&format!("/cars/{}/comment/", car_id)))?;
    let car = find_car(db.get_ref(), car_id).await?;

    match form.validate() {
        Ok(fields) => {
            create_comment(
                db.get_ref(),
                NewComment {
                    fields,
                    car_id: car.id,
                    author_id,
                },
            )
            .await
            .map_err(db_error)?;
        }
        Err(errors) => {
            set_comment_flash(
                &session,
                &CommentFlash::new(
                    car.id,
                    form.content.as_deref().unwrap_or_default(),
                    errors.all_messages(),
                ),
            )?;
        }
    }

    Ok(redirect(&format!("/cars/{}/", car.id)))
}
