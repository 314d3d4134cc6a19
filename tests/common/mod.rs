#![allow(dead_code, unused_macros)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use autoportal::car::{create_car, CarFields, NewCar};
use autoportal::comment::{create_comment, CommentFields, NewComment};
use autoportal::db::init_db;
use autoportal::init::AppData;
use autoportal::orm::{cars, comments, users};
use autoportal::user::{insert_new_user, NewUser};
use autoportal::Config;

pub const PASSWORD: &str = "Strong_password1";

/// Application state over a fresh in-memory database.
pub async fn setup() -> AppData {
    let config = Config::for_database("sqlite::memory:");
    let db = init_db(&config.database_url)
        .await
        .expect("in-memory database");
    AppData::new(config, db)
}

pub async fn user(data: &AppData, username: &str) -> users::Model {
    insert_new_user(
        data.db.get_ref(),
        NewUser {
            username: username.to_owned(),
            email: format!("{}@example.com", username),
            password: PASSWORD.to_owned(),
            ..Default::default()
        },
    )
    .await
    .expect("insert user")
}

pub async fn staff(data: &AppData, username: &str) -> users::Model {
    insert_new_user(
        data.db.get_ref(),
        NewUser {
            username: username.to_owned(),
            password: PASSWORD.to_owned(),
            is_staff: true,
            is_superuser: true,
            ..Default::default()
        },
    )
    .await
    .expect("insert staff")
}

pub async fn car(data: &AppData, owner: &users::Model, make: &str, model: &str) -> cars::Model {
    create_car(
        data.db.get_ref(),
        NewCar {
            fields: CarFields {
                make: make.to_owned(),
                model: model.to_owned(),
                year: Some(2010),
                description: "Хорошее состояние.".to_owned(),
            },
            owner_id: owner.id,
        },
    )
    .await
    .expect("insert car")
}

pub async fn comment(
    data: &AppData,
    car: &cars::Model,
    author: &users::Model,
    content: &str,
) -> comments::Model {
    create_comment(
        data.db.get_ref(),
        NewComment {
            fields: CommentFields {
                content: content.to_owned(),
            },
            car_id: car.id,
            author_id: author.id,
        },
    )
    .await
    .expect("insert comment")
}

/// `Authorization` header value carrying a fresh access token.
pub fn bearer(data: &AppData, user: &users::Model) -> (&'static str, String) {
    let pair = data.keys.issue_pair(user.id).expect("issue tokens");
    ("Authorization", format!("Bearer {}", pair.access))
}

/// The session cookie set by a response, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|c| c.name() == "sessionid")
        .map(|c| c.into_owned())
}

pub fn location<B>(res: &ServiceResponse<B>) -> String {
    res.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}

/// Logs in through the HTML form and returns the session cookie.
macro_rules! login {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&[("username", $username), ("password", common::PASSWORD)])
            .to_request();
        let res = actix_web::test::call_service($app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::FOUND);
        common::session_cookie(&res).expect("session cookie")
    }};
}
