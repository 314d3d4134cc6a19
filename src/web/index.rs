use crate::car::{get_cars_page, CarForTemplate};
use crate::config::Config;
use crate::frontend::TemplateToResponse;
use crate::middleware::ClientCtx;
use crate::template::{Paginator, PaginatorToHtml};
use actix_web::{get, web, Error, Responder};
use askama::Template;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub cars: Vec<CarForTemplate>,
    pub paginator: Paginator,
}

#[derive(Deserialize)]
pub struct IndexQuery {
    pub page: Option<String>,
}

#[get("/")]
async fn view_index(
    client: ClientCtx,
    query: web::Query<IndexQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> Result<impl Responder, Error> {
    // Malformed page numbers fall back to the first page.
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.parse::<i32>().ok())
        .unwrap_or(1)
        .max(1);

    let (cars, total) = get_cars_page(db.get_ref(), page as u64, config.page_size)
        .await
        .map_err(super::db_error)?;

    Ok(IndexTemplate {
        client,
        cars,
        paginator: Paginator::new("/", page, total, config.page_size),
    }
    .to_response())
}
