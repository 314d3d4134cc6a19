#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use autoportal::car::get_car;
use autoportal::comment::{get_comment, get_thread_for_template};
use autoportal::init::create_app;
use autoportal::user::find_by_username;

fn text(body: actix_web::web::Bytes) -> String {
    String::from_utf8(body.to_vec()).expect("utf-8 page")
}

#[actix_rt::test]
async fn test_admin_is_staff_only() {
    let data = common::setup().await;
    common::user(&data, "owner").await;
    common::staff(&data, "admin").await;
    let app = test::init_service(create_app(data.clone())).await;

    let req = test::TestRequest::get().uri("/admin/cars/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/auth/login/?next=%2Fadmin%2Fcars%2F");

    let cookie = login!(&app, "owner");
    let req = test::TestRequest::get().uri("/admin/").cookie(cookie).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let cookie = login!(&app, "admin");
    let req = test::TestRequest::get().uri("/admin/").cookie(cookie).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(test::read_body(res).await);
    assert!(page.contains("Automobile Portal Admin zone"));
}

#[actix_rt::test]
async fn test_car_list_search_and_filters() {
    let data = common::setup().await;
    let ivan = common::user(&data, "ivan").await;
    let maria = common::user(&data, "maria").await;
    common::staff(&data, "admin").await;
    common::car(&data, &ivan, "Ford", "Mustang").await;
    common::car(&data, &maria, "Toyota", "Camry").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "admin");

    let req = test::TestRequest::get()
        .uri("/admin/cars/?q=must")
        .cookie(cookie.clone())
        .to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("<td>Mustang</td>"));
    assert!(!page.contains("<td>Camry</td>"));

    let req = test::TestRequest::get()
        .uri("/admin/cars/?owner=maria")
        .cookie(cookie.clone())
        .to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("<td>Camry</td>"));
    assert!(page.contains("Найдено: 1"));

    let req = test::TestRequest::get()
        .uri("/admin/cars/?year=2010")
        .cookie(cookie)
        .to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("Найдено: 2"));
}

#[actix_rt::test]
async fn test_change_car_with_inline_comments() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let admin = common::staff(&data, "admin").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let keep = common::comment(&data, &car, &owner, "Первый.").await;
    let drop = common::comment(&data, &car, &owner, "Второй.").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "admin");
    let uri = format!("/admin/cars/{}/", car.id);

    let req = test::TestRequest::get().uri(&uri).cookie(cookie.clone()).to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains(&format!("comment-{}-content", keep.id)));

    let keep_field = format!("comment-{}-content", keep.id);
    let drop_content = format!("comment-{}-content", drop.id);
    let drop_field = format!("comment-{}-delete", drop.id);
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(cookie.clone())
        .set_form(&[
            ("make", "Ford"),
            ("model", "Focus RS"),
            ("year", "2016"),
            ("description", "Проверено администратором."),
            (keep_field.as_str(), "Исправленный первый."),
            (drop_content.as_str(), "Второй."),
            (drop_field.as_str(), "on"),
            ("new-content", "Комментарий администратора."),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(common::location(&res), "/admin/cars/");

    let updated = get_car(data.db.get_ref(), car.id).await.unwrap().unwrap();
    assert_eq!(updated.model, "Focus RS");
    assert_eq!(updated.owner_id, owner.id);
    assert!(get_comment(data.db.get_ref(), drop.id).await.unwrap().is_none());

    let thread = get_thread_for_template(data.db.get_ref(), car.id).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].content, "Исправленный первый.");
    assert_eq!(thread[1].content, "Комментарий администратора.");
    assert_eq!(thread[1].author_id, admin.id);
}

#[actix_rt::test]
async fn test_change_car_rejects_everything_on_any_error() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    common::staff(&data, "admin").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let comment = common::comment(&data, &car, &owner, "Первый.").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "admin");

    let field = format!("comment-{}-content", comment.id);
    let req = test::TestRequest::post()
        .uri(&format!("/admin/cars/{}/", car.id))
        .cookie(cookie)
        .set_form(&[
            ("make", "Ford"),
            ("model", "Focus RS"),
            ("year", "2016"),
            ("description", "Описание."),
            (field.as_str(), "<script>"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let unchanged = get_car(data.db.get_ref(), car.id).await.unwrap().unwrap();
    assert_eq!(unchanged.model, "Focus");
    let unchanged = get_comment(data.db.get_ref(), comment.id).await.unwrap().unwrap();
    assert_eq!(unchanged.content, "Первый.");
}

#[actix_rt::test]
async fn test_comment_and_user_lists() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    common::staff(&data, "admin").await;
    let writer = common::user(&data, "writer").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let other = common::car(&data, &writer, "Лада", "Нива").await;
    common::comment(&data, &car, &owner, "Продаю недорого.").await;
    let authored = common::comment(&data, &other, &owner, "Хороший выбор.").await;
    let kept = common::comment(&data, &other, &writer, "Спасибо.").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "admin");

    let req = test::TestRequest::get()
        .uri("/admin/comments/")
        .cookie(cookie.clone())
        .to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("Ford Focus"));
    assert!(page.contains("Продаю недорого."));

    let req = test::TestRequest::get()
        .uri("/admin/users/")
        .cookie(cookie.clone())
        .to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("owner@example.com"));

    let req = test::TestRequest::post()
        .uri(&format!("/admin/users/{}/delete/", owner.id))
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(common::location(&res), "/admin/users/");
    assert!(find_by_username(data.db.get_ref(), "owner").await.unwrap().is_none());
    assert!(get_car(data.db.get_ref(), car.id).await.unwrap().is_none());
    // Comments the user wrote on other cars go as well.
    assert!(get_comment(data.db.get_ref(), authored.id).await.unwrap().is_none());
    assert!(get_car(data.db.get_ref(), other.id).await.unwrap().is_some());
    assert!(get_comment(data.db.get_ref(), kept.id).await.unwrap().is_some());
}

#[actix_rt::test]
async fn test_admin_deletes_car() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    common::staff(&data, "admin").await;
    let car = common::car(&data, &owner, "Ford", "Focus").await;
    let app = test::init_service(create_app(data.clone())).await;
    let cookie = login!(&app, "admin");
    let uri = format!("/admin/cars/{}/delete/", car.id);

    let req = test::TestRequest::get().uri(&uri).cookie(cookie.clone()).to_request();
    let page = text(test::call_and_read_body(&app, req).await);
    assert!(page.contains("Ford Focus"));

    let req = test::TestRequest::post().uri(&uri).cookie(cookie).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(common::location(&res), "/admin/cars/");
    assert!(get_car(data.db.get_ref(), car.id).await.unwrap().is_none());
}
