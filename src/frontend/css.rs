use actix_web::{get, HttpResponse, Responder};

static STYLESHEET: &str = include_str!("../../templates/css/main.css");

#[get("/style.css")]
pub async fn view_css() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/css")
        .insert_header(("Cache-Control", "public, max-age=3600"))
        .body(STYLESHEET)
}
