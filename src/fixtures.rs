//! Loads sample data from header-less CSV files.
//!
//! Files are read in foreign key order: `users.csv`, `cars.csv`, then
//! `comments.csv`. Loading twice creates nothing new.

use crate::car::{create_car, CarFields, NewCar};
use crate::comment::{create_comment, CommentFields, NewComment};
use crate::orm::{cars, comments, users};
use crate::user::{find_by_username, insert_new_user, NewUser};
use derive_more::Display;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

pub const USERS_FILE: &str = "users.csv";
pub const CARS_FILE: &str = "cars.csv";
pub const COMMENTS_FILE: &str = "comments.csv";

#[derive(Debug, Display)]
pub enum FixtureError {
    #[display(fmt = "{}: {}", file, error)]
    Open { file: String, error: std::io::Error },
    #[display(fmt = "{} row {}: {}", file, row, error)]
    Row {
        file: &'static str,
        row: usize,
        error: csv::Error,
    },
    #[display(fmt = "{} row {}: no {} with id {}", file, row, kind, id)]
    MissingReference {
        file: &'static str,
        row: usize,
        kind: &'static str,
        id: i32,
    },
    #[display(fmt = "database: {}", _0)]
    Database(DbErr),
}

impl std::error::Error for FixtureError {}

impl From<DbErr> for FixtureError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

/// Rows created per file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixtureReport {
    pub users: usize,
    pub cars: usize,
    pub comments: usize,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CarRow {
    make: String,
    model: String,
    year: Option<i32>,
    description: String,
    owner_id: i32,
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    content: String,
    car_id: i32,
    author_id: i32,
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(source)
}

fn open(dir: &Path, file: &str) -> Result<std::fs::File, FixtureError> {
    let path = dir.join(file);
    std::fs::File::open(&path).map_err(|error| FixtureError::Open {
        file: path.display().to_string(),
        error,
    })
}

/// Loads the three fixture files from `dir`.
pub async fn load_dir<C: ConnectionTrait>(db: &C, dir: &Path) -> Result<FixtureReport, FixtureError> {
    let users = load_users(db, open(dir, USERS_FILE)?).await?;
    let cars = load_cars(db, open(dir, CARS_FILE)?).await?;
    let comments = load_comments(db, open(dir, COMMENTS_FILE)?).await?;
    Ok(FixtureReport {
        users,
        cars,
        comments,
    })
}

/// Creates each user whose username is not taken yet.
pub async fn load_users<C: ConnectionTrait, R: Read>(db: &C, source: R) -> Result<usize, FixtureError> {
    let mut created = 0;
    for (i, row) in reader(source).deserialize::<UserRow>().enumerate() {
        let row = row.map_err(|error| FixtureError::Row {
            file: USERS_FILE,
            row: i + 1,
            error,
        })?;
        if find_by_username(db, &row.username).await?.is_some() {
            continue;
        }

        insert_new_user(
            db,
            NewUser {
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                password: row.password,
                ..Default::default()
            },
        )
        .await?;
        created += 1;
    }
    log::info!("load_users: {} created", created);
    Ok(created)
}

async fn user_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    Ok(users::Entity::find_by_id(id).one(db).await?.is_some())
}

/// Creates each car unless one with identical columns exists.
pub async fn load_cars<C: ConnectionTrait, R: Read>(db: &C, source: R) -> Result<usize, FixtureError> {
    let mut created = 0;
    for (i, row) in reader(source).deserialize::<CarRow>().enumerate() {
        let row = row.map_err(|error| FixtureError::Row {
            file: CARS_FILE,
            row: i + 1,
            error,
        })?;
        if !user_exists(db, row.owner_id).await? {
            return Err(FixtureError::MissingReference {
                file: CARS_FILE,
                row: i + 1,
                kind: "user",
                id: row.owner_id,
            });
        }

        let year = match row.year {
            Some(year) => cars::Column::Year.eq(year),
            None => cars::Column::Year.is_null(),
        };
        let existing = cars::Entity::find()
            .filter(cars::Column::Make.eq(row.make.as_str()))
            .filter(cars::Column::Model.eq(row.model.as_str()))
            .filter(year)
            .filter(cars::Column::Description.eq(row.description.as_str()))
            .filter(cars::Column::OwnerId.eq(row.owner_id))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        create_car(
            db,
            NewCar {
                fields: CarFields {
                    make: row.make,
                    model: row.model,
                    year: row.year,
                    description: row.description,
                },
                owner_id: row.owner_id,
            },
        )
        .await?;
        created += 1;
    }
    log::info!("load_cars: {} created", created);
    Ok(created)
}

/// Creates each comment unless one with identical columns exists.
pub async fn load_comments<C: ConnectionTrait, R: Read>(
    db: &C,
    source: R,
) -> Result<usize, FixtureError> {
    let mut created = 0;
    for (i, row) in reader(source).deserialize::<CommentRow>().enumerate() {
        let row = row.map_err(|error| FixtureError::Row {
            file: COMMENTS_FILE,
            row: i + 1,
            error,
        })?;
        if cars::Entity::find_by_id(row.car_id).one(db).await?.is_none() {
            return Err(FixtureError::MissingReference {
                file: COMMENTS_FILE,
                row: i + 1,
                kind: "car",
                id: row.car_id,
            });
        }
        if !user_exists(db, row.author_id).await? {
            return Err(FixtureError::MissingReference {
                file: COMMENTS_FILE,
                row: i + 1,
                kind: "user",
                id: row.author_id,
            });
        }

        let existing = comments::Entity::find()
            .filter(comments::Column::Content.eq(row.content.as_str()))
            .filter(comments::Column::CarId.eq(row.car_id))
            .filter(comments::Column::AuthorId.eq(row.author_id))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        create_comment(
            db,
            NewComment {
                fields: CommentFields {
                    content: row.content,
                },
                car_id: row.car_id,
                author_id: row.author_id,
            },
        )
        .await?;
        created += 1;
    }
    log::info!("load_comments: {} created", created);
    Ok(created)
}
