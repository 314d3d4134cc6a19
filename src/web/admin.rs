use super::{db_error, login_redirect, redirect};
use crate::admin::{AdminSite, CARS, COMMENTS, USERS};
use crate::car::{
    delete_car, get_car, get_filter_choices, search_cars, update_car, CarFilterChoices,
    CarForTemplate, CarPayload, CarSearch,
};
use crate::comment::{
    create_comment, delete_comment, get_comment_line_items, get_thread_for_template,
    update_comment, CommentFields, CommentLineItem, CommentPayload, NewComment,
};
use crate::frontend::TemplateToResponse;
use crate::middleware::ClientCtx;
use crate::orm::{cars, comments, users};
use crate::user::{delete_user, get_client_user, list_users};
use crate::validators::{ValidationErrors, YearInput};
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use askama::Template;
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::collections::HashMap;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(view_cars)
        .service(change_car_form)
        .service(change_car_post)
        .service(delete_car_form)
        .service(delete_car_post)
        .service(view_comments)
        .service(view_users)
        .service(delete_user_form)
        .service(delete_user_post);
}

/// Turns guests away to the login form and other non-staff to a 403.
fn require_staff(client: &ClientCtx, req: &HttpRequest) -> Result<(), Error> {
    if !client.is_user() {
        return Err(login_redirect(req.path()));
    }
    if !client.is_staff() {
        return Err(error::ErrorForbidden("Staff access only."));
    }
    Ok(())
}

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct DashboardTemplate<'a> {
    pub client: ClientCtx,
    pub site: &'a AdminSite,
}

#[derive(Template)]
#[template(path = "admin/car_list.html")]
pub struct CarListTemplate<'a> {
    pub client: ClientCtx,
    pub site: &'a AdminSite,
    pub columns: &'static [&'static str],
    pub cars: Vec<CarForTemplate>,
    pub search: CarSearch,
    pub choices: CarFilterChoices,
}

/// One comment row of the car change page.
#[derive(Clone, Debug, Default)]
pub struct InlineComment {
    pub id: i32,
    pub author: String,
    pub content: String,
    pub delete: bool,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin/car_change.html")]
pub struct CarChangeTemplate<'a> {
    pub client: ClientCtx,
    pub site: &'a AdminSite,
    pub car: cars::Model,
    pub owner: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub description: String,
    pub errors: ValidationErrors,
    pub comments: Vec<InlineComment>,
    pub new_content: String,
    pub new_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin/comment_list.html")]
pub struct CommentListTemplate<'a> {
    pub client: ClientCtx,
    pub site: &'a AdminSite,
    pub columns: &'static [&'static str],
    pub comments: Vec<CommentLineItem>,
}

#[derive(Template)]
#[template(path = "admin/user_list.html")]
pub struct UserListTemplate<'a> {
    pub client: ClientCtx,
    pub site: &'a AdminSite,
    pub columns: &'static [&'static str],
    pub users: Vec<users::Model>,
}

#[derive(Template)]
#[template(path = "admin/delete.html")]
pub struct DeleteTemplate<'a> {
    pub client: ClientCtx,
    pub site: &'a AdminSite,
    pub object_kind: &'static str,
    pub object_name: String,
    pub action: String,
    pub cancel: String,
}

#[get("/admin/")]
async fn view_dashboard(
    client: ClientCtx,
    req: HttpRequest,
    site: web::Data<AdminSite>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    Ok(DashboardTemplate {
        client,
        site: site.get_ref(),
    }
    .to_response())
}

#[get("/admin/cars/")]
async fn view_cars(
    client: ClientCtx,
    req: HttpRequest,
    query: web::Query<CarSearch>,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    let search = query.into_inner();
    let cars = search_cars(db.get_ref(), &search).await.map_err(db_error)?;
    let choices = get_filter_choices(db.get_ref()).await.map_err(db_error)?;

    Ok(CarListTemplate {
        client,
        site: site.get_ref(),
        columns: CARS.columns,
        cars,
        search,
        choices,
    }
    .to_response())
}

async fn find_car(db: &DatabaseConnection, id: i32) -> Result<cars::Model, Error> {
    get_car(db, id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error::ErrorNotFound("Car not found."))
}

async fn owner_name(db: &DatabaseConnection, owner_id: i32) -> Result<String, Error> {
    Ok(get_client_user(db, owner_id)
        .await
        .map_err(db_error)?
        .map(|u| u.username)
        .unwrap_or_default())
}

#[get("/admin/cars/{id}/")]
async fn change_car_form(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    let owner = owner_name(db.get_ref(), car.owner_id).await?;
    let comments = get_thread_for_template(db.get_ref(), car.id)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|c| InlineComment {
            id: c.id,
            author: c.get_author().to_owned(),
            content: c.content,
            ..Default::default()
        })
        .collect();
    let payload = CarPayload::from(&car);

    Ok(CarChangeTemplate {
        client,
        site: site.get_ref(),
        owner,
        make: car.make.to_owned(),
        model: car.model.to_owned(),
        year: payload.year_text(),
        description: car.description.to_owned(),
        car,
        errors: ValidationErrors::new(),
        comments,
        new_content: String::new(),
        new_errors: Vec::new(),
    }
    .to_response())
}

/// The car change form is flat: car fields by name, existing comments as
/// `comment-{id}-content` and `comment-{id}-delete`, and `new-content`.
#[post("/admin/cars/{id}/")]
async fn change_car_post(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    form: web::Form<Vec<(String, String)>>,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    require_staff(&client, &req)?;
    let author_id = client
        .get_id()
        .ok_or_else(|| login_redirect(req.path()))?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;
    let fields: HashMap<String, String> = form.into_inner().into_iter().collect();

    let payload = CarPayload {
        make: fields.get("make").cloned(),
        model: fields.get("model").cloned(),
        year: fields.get("year").cloned().map(YearInput::Text),
        description: fields.get("description").cloned(),
    };
    let car_result = payload.validate();

    let thread = get_thread_for_template(db.get_ref(), car.id)
        .await
        .map_err(db_error)?;
    let mut inlines = Vec::with_capacity(thread.len());
    let mut changes: Vec<(comments::Model, Option<CommentFields>)> = Vec::new();
    for comment in thread {
        let content = fields
            .get(&format!("comment-{}-content", comment.id))
            .cloned()
            .unwrap_or_else(|| comment.content.to_owned());
        let delete = fields.contains_key(&format!("comment-{}-delete", comment.id));
        let mut inline = InlineComment {
            id: comment.id,
            author: comment.get_author().to_owned(),
            content: content.to_owned(),
            delete,
            errors: Vec::new(),
        };

        if delete {
            changes.push((comment.into(), None));
        } else if content != comment.content {
            match (CommentPayload {
                content: Some(content),
            })
            .validate()
            {
                Ok(fields) => changes.push((comment.into(), Some(fields))),
                Err(errors) => inline.errors = errors.all_messages(),
            }
        }
        inlines.push(inline);
    }

    let new_content = fields.get("new-content").cloned().unwrap_or_default();
    let mut new_errors = Vec::new();
    let new_comment = if new_content.trim().is_empty() {
        None
    } else {
        match (CommentPayload {
            content: Some(new_content.to_owned()),
        })
        .validate()
        {
            Ok(fields) => Some(fields),
            Err(errors) => {
                new_errors = errors.all_messages();
                None
            }
        }
    };

    let inline_failed = !new_errors.is_empty() || inlines.iter().any(|c| !c.errors.is_empty());
    let car_fields = match car_result {
        Ok(car_fields) if !inline_failed => car_fields,
        result => {
            let owner = owner_name(db.get_ref(), car.owner_id).await?;
            return Ok(CarChangeTemplate {
                client,
                site: site.get_ref(),
                car,
                owner,
                make: payload.make.to_owned().unwrap_or_default(),
                model: payload.model.to_owned().unwrap_or_default(),
                year: payload.year_text(),
                description: payload.description.to_owned().unwrap_or_default(),
                errors: result.err().unwrap_or_default(),
                comments: inlines,
                new_content,
                new_errors,
            }
            .to_response());
        }
    };

    let car_id = car.id;
    let txn = db.begin().await.map_err(db_error)?;
    update_car(&txn, car, car_fields).await.map_err(db_error)?;
    for (comment, fields) in changes {
        match fields {
            Some(fields) => {
                update_comment(&txn, comment, fields)
                    .await
                    .map_err(db_error)?;
            }
            None => {
                delete_comment(&txn, comment.id).await.map_err(db_error)?;
            }
        }
    }
    if let Some(fields) = new_comment {
        create_comment(
            &txn,
            NewComment {
                fields,
                car_id,
                author_id,
            },
        )
        .await
        .map_err(db_error)?;
    }
    txn.commit().await.map_err(db_error)?;

    log::info!("change_car_post: {} changed car {}", client.get_name(), car_id);
    Ok(redirect("/admin/cars/"))
}

#[get("/admin/cars/{id}/delete/")]
async fn delete_car_form(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;

    Ok(DeleteTemplate {
        client,
        site: site.get_ref(),
        object_kind: "автомобиль",
        object_name: format!("{} {}", car.make, car.model),
        action: format!("/admin/cars/{}/delete/", car.id),
        cancel: format!("/admin/cars/{}/", car.id),
    }
    .to_response())
}

#[post("/admin/cars/{id}/delete/")]
async fn delete_car_post(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    require_staff(&client, &req)?;
    let car = find_car(db.get_ref(), path.into_inner()).await?;

    delete_car(db.get_ref(), car.id).await.map_err(db_error)?;
    log::info!("delete_car_post: {} deleted car {}", client.get_name(), car.id);
    Ok(redirect("/admin/cars/"))
}

#[get("/admin/comments/")]
async fn view_comments(
    client: ClientCtx,
    req: HttpRequest,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    let comments = get_comment_line_items(db.get_ref())
        .await
        .map_err(db_error)?;

    Ok(CommentListTemplate {
        client,
        site: site.get_ref(),
        columns: COMMENTS.columns,
        comments,
    }
    .to_response())
}

#[get("/admin/users/")]
async fn view_users(
    client: ClientCtx,
    req: HttpRequest,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    let users = list_users(db.get_ref()).await.map_err(db_error)?;

    Ok(UserListTemplate {
        client,
        site: site.get_ref(),
        columns: USERS.columns,
        users,
    }
    .to_response())
}

async fn find_user_name(db: &DatabaseConnection, id: i32) -> Result<String, Error> {
    get_client_user(db, id)
        .await
        .map_err(db_error)?
        .map(|u| u.username)
        .ok_or_else(|| error::ErrorNotFound("User not found."))
}

#[get("/admin/users/{id}/delete/")]
async fn delete_user_form(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    site: web::Data<AdminSite>,
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    require_staff(&client, &req)?;
    let id = path.into_inner();
    let username = find_user_name(db.get_ref(), id).await?;

    Ok(DeleteTemplate {
        client,
        site: site.get_ref(),
        object_kind: "пользователя",
        object_name: username,
        action: format!("/admin/users/{}/delete/", id),
        cancel: "/admin/users/".to_owned(),
    }
    .to_response())
}

#[post("/admin/users/{id}/delete/")]
async fn delete_user_post(
    client: ClientCtx,
    req: HttpRequest,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    require_staff(&client, &req)?;
    let id = path.into_inner();
    let username = find_user_name(db.get_ref(), id).await?;

    delete_user(db.get_ref(), id).await.map_err(db_error)?;
    log::info!("delete_user_post: {} deleted user {}", client.get_name(), username);
    Ok(redirect("/admin/users/"))
}
