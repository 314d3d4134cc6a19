use crate::auth::password::hash_password;
use crate::orm::users;
use crate::validators::{ValidationError, ValidationErrors, MAX_CHARFIELD};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex"));

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl From<users::Model> for ClientUser {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
        }
    }
}

/// Account details accepted from the registration form or the fixture loader.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

pub async fn get_client_user<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .column(users::Column::IsStaff)
        .column(users::Column::IsSuperuser)
        .column(users::Column::IsActive)
        .into_model::<ClientUser>()
        .one(db)
        .await
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
}

/// Checks a registration request. The password is only length checked.
pub fn validate_new_user(user: &NewUser, password_confirm: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let username = user.username.trim();

    if username.is_empty() {
        errors.add("username", ValidationError::required());
    } else if username.chars().count() > MAX_CHARFIELD || !USERNAME_REGEX.is_match(username) {
        errors.add(
            "username",
            ValidationError::new(
                "invalid",
                "Введите правильное имя пользователя. Оно может содержать только буквы, \
                 цифры и знаки @/./+/-/_.",
                Some(username),
            ),
        );
    }
    if user.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            ValidationError::new(
                "password_too_short",
                format!(
                    "Введённый пароль слишком короткий. Он должен содержать как минимум {} символов.",
                    MIN_PASSWORD_LENGTH
                ),
                None,
            ),
        );
    }
    if user.password != password_confirm {
        errors.add(
            "password_confirm",
            ValidationError::new("password_mismatch", "Введённые пароли не совпадают.", None),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Hashes the password and inserts the user. Does not check for duplicates.
pub async fn insert_new_user<C: ConnectionTrait>(
    db: &C,
    user: NewUser,
) -> Result<users::Model, DbErr> {
    let password = hash_password(&user.password)
        .map_err(|e| DbErr::Custom(format!("password hashing failed: {}", e)))?;

    users::ActiveModel {
        username: Set(user.username.trim().to_owned()),
        first_name: Set(user.first_name),
        last_name: Set(user.last_name),
        email: Set(user.email),
        password: Set(password),
        is_staff: Set(user.is_staff),
        is_superuser: Set(user.is_superuser),
        is_active: Set(true),
        date_joined: Set(Utc::now().naive_utc()),
        ..Default::default() // id is `NotSet`
    }
    .insert(db)
    .await
}

/// Deletes the user. Their cars and comments cascade in the database.
pub async fn delete_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let res = users::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

pub async fn list_users<C: ConnectionTrait>(db: &C) -> Result<Vec<users::Model>, DbErr> {
    users::Entity::find()
        .order_by_asc(users::Column::Username)
        .all(db)
        .await
}
