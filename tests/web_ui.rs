#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use autoportal::car::get_car;
use autoportal::init::create_app;
use autoportal::session::FLASH_DRAFT_CHARS;
use autoportal::user::find_by_username;

fn text(body: actix_web::web::Bytes) -> String {
    String::from_utf8(body.to_vec()).expect("utf-8 page")
}

#[actix_rt::test]
async fn test_index_lists_cars() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    common::car(&data, &owner, "Ford", "Mustang").await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(test::read_body(res).await);
    assert!(page.contains("Ford Mustang"));
    assert!(page.contains("Войти"));

    // Malformed and out of range pages fall back instead of failing.
    let req = test::TestRequest::get().uri("/?page=abc").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::get().uri("/?page=50").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_guest_is_sent_to_login() {
    let data = common::setup().await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::get().uri("/cars/create/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/auth/login/?next=%2Fcars%2Fcreate%2F");
}

#[actix_rt::test]
async fn test_create_car_through_form() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "owner");

    let req = test::TestRequest::post()
        .uri("/cars/create/")
        .cookie(cookie.clone())
        .set_form(&[
            ("make", "Лада"),
            ("model", "Нива"),
            ("year", "1977"),
            ("description", "Легендарный внедорожник."),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/");

    let car = get_car(data.db.get_ref(), 1).await.unwrap().unwrap();
    assert_eq!(car.owner_id, owner.id);
    assert_eq!(car.year, Some(1977));

    let req = test::TestRequest::post()
        .uri("/cars/create/")
        .cookie(cookie)
        .set_form(&[
            ("make", "Lada!"),
            ("model", "Нива"),
            ("year", "19"),
            ("description", "Текст"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(test::read_body(res).await);
    assert!(page.contains("Год должен состоять из 4 арабских цифр."));
    assert!(page.contains("value=\"Нива\""));
}

#[actix_rt::test]
async fn test_only_owner_edits() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    common::user(&data, "stranger").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let app = test::init_service(create_app(data.clone())).await;
    let detail = format!("/cars/{}/", car.id);

    let cookie = login!(&app, "stranger");
    let req = test::TestRequest::get()
        .uri(&format!("/cars/{}/edit/", car.id))
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), detail);

    let req = test::TestRequest::post()
        .uri(&format!("/cars/{}/delete/", car.id))
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(common::location(&res), detail);
    assert!(get_car(data.db.get_ref(), car.id).await.unwrap().is_some());

    let cookie = login!(&app, "owner");
    let req = test::TestRequest::post()
        .uri(&format!("/cars/{}/edit/", car.id))
        .cookie(cookie)
        .set_form(&[
            ("make", "Ford"),
            ("model", "Focus ST"),
            ("year", ""),
            ("description", "Обновлено."),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let updated = get_car(data.db.get_ref(), car.id).await.unwrap().unwrap();
    assert_eq!(updated.model, "Focus ST");
    assert_eq!(updated.year, None);
    assert!(updated.updated_at > car.updated_at);
}

#[actix_rt::test]
async fn test_superuser_deletes_any_car() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    common::staff(&data, "admin").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "admin");

    let req = test::TestRequest::get()
        .uri(&format!("/cars/{}/delete/", car.id))
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/cars/{}/delete/", car.id))
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(common::location(&res), "/");
    assert!(get_car(data.db.get_ref(), car.id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_comment_errors_survive_redirect() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "owner");
    let detail = format!("/cars/{}/", car.id);

    let req = test::TestRequest::post()
        .uri(&format!("/cars/{}/comment/", car.id))
        .cookie(cookie)
        .set_form(&[("content", "$$$")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), detail);
    let cookie = common::session_cookie(&res).expect("flash stored in session");

    let req = test::TestRequest::get()
        .uri(&detail)
        .cookie(cookie.clone())
        .to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("В текстовом описании допустимы"));
    assert!(page.contains("$$$"));

    let req = test::TestRequest::post()
        .uri(&format!("/cars/{}/comment/", car.id))
        .cookie(cookie)
        .set_form(&[("content", "Отличная машина!")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);

    // Guests read the thread too.
    let req = test::TestRequest::get().uri(&detail).to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("Отличная машина!"));
    assert!(!page.contains("$$$"));
}

#[actix_rt::test]
async fn test_long_rejected_comment_still_redirects() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "owner");
    let detail = format!("/cars/{}/", car.id);
    let draft = format!("{}$", "a".repeat(5000));

    let req = test::TestRequest::post()
        .uri(&format!("/cars/{}/comment/", car.id))
        .cookie(cookie)
        .set_form(&[("content", draft.as_str())])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), detail);
    let cookie = common::session_cookie(&res).expect("flash stored in session");

    let req = test::TestRequest::get().uri(&detail).cookie(cookie).to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("В текстовом описании допустимы"));
    assert!(page.contains(&"a".repeat(FLASH_DRAFT_CHARS)));
    assert!(!page.contains(&"a".repeat(FLASH_DRAFT_CHARS + 1)));
}

#[actix_rt::test]
async fn test_missing_car_renders_error_page() {
    let data = common::setup().await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::get().uri("/cars/999/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.headers().get("Content-Type").unwrap(),
        "text/html; charset=utf-8"
    );
    let page = text(test::read_body(res).await);
    assert!(page.contains("Страница не найдена"));

    let req = test::TestRequest::get().uri("/no/such/page/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_registration_and_logout() {
    let data = common::setup().await;
    let app = test::init_service(create_app(data.clone())).await;

    let form = [
        ("username", "new_user"),
        ("email", "new@example.com"),
        ("first_name", "Анна"),
        ("last_name", "Смирнова"),
        ("password", common::PASSWORD),
        ("password_confirm", common::PASSWORD),
    ];
    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form(&form)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let user = find_by_username(data.db.get_ref(), "new_user")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_staff);
    assert_ne!(user.password, common::PASSWORD);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form(&form)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(test::read_body(res).await);
    assert!(page.contains("Пользователь с таким именем уже существует."));

    let cookie = login!(&app, "new_user");
    let req = test::TestRequest::post()
        .uri("/auth/logout/")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let removed = common::session_cookie(&res).expect("removal cookie");
    assert_eq!(removed.value(), "");
}

#[actix_rt::test]
async fn test_login_failure_keeps_username() {
    let data = common::setup().await;
    common::user(&data, "owner").await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(&[("username", "owner"), ("password", "nope"), ("next", "//evil.example")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(test::read_body(res).await);
    assert!(page.contains("value=\"owner\""));
    assert!(page.contains("Пожалуйста, введите правильные имя пользователя и пароль."));
}
