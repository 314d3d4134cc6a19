mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use autoportal::init::create_app;
use autoportal::orm::users;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_obtain_refresh_and_verify() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/create/")
        .set_json(json!({"username": "owner", "password": common::PASSWORD}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let pair: Value = test::read_body_json(res).await;
    let access = pair["access"].as_str().unwrap().to_owned();
    let refresh = pair["refresh"].as_str().unwrap().to_owned();

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/verify/")
        .set_json(json!({ "token": access }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({}));

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/refresh/")
        .set_json(json!({ "refresh": refresh }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let new_access = body["access"].as_str().unwrap();
    assert_eq!(data.keys.verify_access(new_access).unwrap().user_id, owner.id);

    // A refresh token is not a bearer credential.
    let req = test::TestRequest::post()
        .uri("/api/cars/")
        .insert_header(("Authorization", format!("Bearer {}", refresh)))
        .set_json(json!({"make": "Ford", "model": "Focus", "description": "Новая."}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_wrong_credentials() {
    let data = common::setup().await;
    common::user(&data, "owner").await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/create/")
        .set_json(json!({"username": "owner", "password": "wrong-password"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["detail"], "No active account found with the given credentials");

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/create/")
        .set_json(json!({"username": "owner"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert!(body["password"].is_array());
}

#[actix_rt::test]
async fn test_inactive_user_gets_no_tokens() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let mut active: users::ActiveModel = owner.into();
    active.is_active = Set(false);
    active.update(data.db.get_ref()).await.unwrap();
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/create/")
        .set_form(&[("username", "owner"), ("password", common::PASSWORD)])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_access_token_cannot_refresh() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let app = test::init_service(create_app(data.clone())).await;
    let pair = data.keys.issue_pair(owner.id).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/auth/jwt/refresh/")
        .set_json(json!({ "refresh": pair.access }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/auth/jwt/create/")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
}

#[actix_rt::test]
async fn test_docs() {
    let data = common::setup().await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::get().uri("/docs/openapi/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["paths"]["/api/cars/"].is_object());

    let req = test::TestRequest::get().uri("/docs/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/docs/swagger/");

    let req = test::TestRequest::get().uri("/docs/swagger/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}
