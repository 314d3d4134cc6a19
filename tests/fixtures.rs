mod common;

use autoportal::car::select_cars;
use autoportal::fixtures::{load_cars, load_dir, FixtureError, FixtureReport};
use autoportal::user::find_by_username;
use sea_orm::PaginatorTrait;
use std::path::Path;

#[actix_rt::test]
async fn test_load_sample_data_twice() {
    let data = common::setup().await;
    let db = data.db.get_ref();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_data");

    let report = load_dir(db, &dir).await.unwrap();
    assert_eq!(
        report,
        FixtureReport {
            users: 3,
            cars: 4,
            comments: 4
        }
    );
    let user = find_by_username(db, "ivanov").await.unwrap().unwrap();
    assert!(user.password.starts_with("$argon2"));

    let report = load_dir(db, &dir).await.unwrap();
    assert_eq!(report, FixtureReport::default());
    assert_eq!(select_cars().count(db).await.unwrap(), 4);
}

#[actix_rt::test]
async fn test_unknown_owner_names_file_and_row() {
    let data = common::setup().await;
    let owner = common::user(&data, "owner").await;
    let rows = format!(
        "Ford,Focus,2010,Хэтчбек.,{}\nToyota,Camry,,Седан.,{}\n",
        owner.id,
        owner.id + 100
    );

    let err = load_cars(data.db.get_ref(), rows.as_bytes()).await.unwrap_err();
    assert!(matches!(err, FixtureError::MissingReference { row: 2, .. }));
    assert_eq!(err.to_string(), format!("cars.csv row 2: no user with id {}", owner.id + 100));
}
