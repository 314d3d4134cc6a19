use super::{author_or_staff, owner_or_staff, Denial};
use crate::orm::{cars, comments};
use crate::user::ClientUser;
use actix_web::http::Method;
use chrono::NaiveDate;

fn user(id: i32, is_staff: bool, is_active: bool) -> ClientUser {
    ClientUser {
        id,
        username: format!("user{}", id),
        is_staff,
        is_superuser: false,
        is_active,
    }
}

fn car(owner_id: i32) -> cars::Model {
    let at = NaiveDate::from_ymd_opt(2022, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap();
    cars::Model {
        id: 1,
        make: "Toyota".to_owned(),
        model: "Camry".to_owned(),
        year: Some(2019),
        description: "Седан".to_owned(),
        created_at: at,
        updated_at: at,
        owner_id,
    }
}

fn comment(author_id: i32) -> comments::Model {
    comments::Model {
        id: 1,
        content: "Хорошая машина".to_owned(),
        created_at: car(1).created_at,
        car_id: 1,
        author_id,
    }
}

#[test]
fn test_safe_methods_always_pass() {
    let policy = owner_or_staff();
    for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
        assert_eq!(policy.check(None, &method, &car(1)), Ok(()));
    }
}

#[test]
fn test_anonymous_write_is_unauthenticated() {
    let policy = owner_or_staff();
    assert_eq!(policy.has_permission(None, &Method::POST), Err(Denial::NotAuthenticated));
    assert_eq!(policy.check(None, &Method::DELETE, &car(1)), Err(Denial::NotAuthenticated));
}

#[test]
fn test_owner_and_staff_may_write() {
    let policy = owner_or_staff();
    assert_eq!(policy.check(Some(&user(1, false, true)), &Method::PUT, &car(1)), Ok(()));
    assert_eq!(policy.check(Some(&user(9, true, true)), &Method::PUT, &car(1)), Ok(()));
    assert_eq!(
        policy.check(Some(&user(2, false, true)), &Method::PUT, &car(1)),
        Err(Denial::PermissionDenied)
    );
}

#[test]
fn test_inactive_owner_is_denied() {
    let policy = owner_or_staff();
    assert_eq!(
        policy.check(Some(&user(1, false, false)), &Method::DELETE, &car(1)),
        Err(Denial::PermissionDenied)
    );
    assert_eq!(
        policy.check(Some(&user(5, true, false)), &Method::DELETE, &car(1)),
        Err(Denial::PermissionDenied)
    );
}

#[test]
fn test_author_policy_uses_author() {
    let policy = author_or_staff();
    assert_eq!(policy.check(Some(&user(4, false, true)), &Method::PUT, &comment(4)), Ok(()));
    assert_eq!(
        policy.check(Some(&user(1, false, true)), &Method::PUT, &comment(4)),
        Err(Denial::PermissionDenied)
    );
}
