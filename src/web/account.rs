use super::{db_error, redirect, safe_next};
use crate::auth::authenticate;
use crate::frontend::TemplateToResponse;
use crate::middleware::ClientCtx;
use crate::session;
use crate::user::{find_by_username, insert_new_user, validate_new_user, NewUser};
use crate::validators::{ValidationError, ValidationErrors};
use actix_session::Session;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama::Template;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_logout)
        .service(post_logout)
        .service(view_registration)
        .service(post_registration);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub next: &'a str,
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "logout.html")]
pub struct LogoutTemplate {
    pub client: ClientCtx,
    pub logged_out: bool,
}

#[derive(Template)]
#[template(path = "registration.html")]
pub struct RegistrationTemplate {
    pub client: ClientCtx,
    pub form: RegistrationForm,
    pub errors: ValidationErrors,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

const LOGIN_FAILED: &str = "Пожалуйста, введите правильные имя пользователя и пароль. \
                            Оба поля могут быть чувствительны к регистру.";

#[get("/auth/login/")]
async fn view_login(client: ClientCtx, query: web::Query<LoginQuery>) -> impl Responder {
    LoginTemplate {
        client,
        username: "",
        next: safe_next(query.next.as_deref()),
        error: None,
    }
    .to_response()
}

#[post("/auth/login/")]
async fn post_login(
    client: ClientCtx,
    session: Session,
    form: web::Form<LoginForm>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let next = safe_next(form.next.as_deref());
    let user = authenticate(db.get_ref(), &form.username, &form.password)
        .await
        .map_err(db_error)?;

    match user {
        Some(user) => {
            session::login(&session, user.id)?;
            log::info!("post_login: {} logged in", user.username);
            Ok(redirect(next))
        }
        None => Ok(LoginTemplate {
            client,
            username: form.username.trim(),
            next,
            error: Some(LOGIN_FAILED),
        }
        .to_response()),
    }
}

#[get("/auth/logout/")]
async fn view_logout(client: ClientCtx) -> impl Responder {
    LogoutTemplate {
        client,
        logged_out: false,
    }
    .to_response()
}

#[post("/auth/logout/")]
async fn post_logout(session: Session) -> impl Responder {
    session::logout(&session);
    // The context was resolved before logging out.
    LogoutTemplate {
        client: ClientCtx::default(),
        logged_out: true,
    }
    .to_response()
}

#[get("/auth/registration/")]
async fn view_registration(client: ClientCtx) -> impl Responder {
    RegistrationTemplate {
        client,
        form: RegistrationForm::default(),
        errors: ValidationErrors::new(),
    }
    .to_response()
}

#[post("/auth/registration/")]
async fn post_registration(
    client: ClientCtx,
    form: web::Form<RegistrationForm>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    let form = form.into_inner();
    let new_user = NewUser {
        username: form.username.trim().to_owned(),
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password.to_owned(),
        ..Default::default()
    };

    let mut errors = match validate_new_user(&new_user, &form.password_confirm) {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    if !new_user.username.is_empty()
        && find_by_username(db.get_ref(), &new_user.username)
            .await
            .map_err(db_error)?
            .is_some()
    {
        errors.add(
            "username",
            ValidationError::new(
                "unique",
                "Пользователь с таким именем уже существует.",
                Some(&new_user.username),
            ),
        );
    }

    if !errors.is_empty() {
        return Ok(RegistrationTemplate {
            client,
            form: RegistrationForm {
                password: String::new(),
                password_confirm: String::new(),
                ..form
            },
            errors,
        }
        .to_response());
    }

    let user = insert_new_user(db.get_ref(), new_user)
        .await
        .map_err(db_error)?;
    log::info!("post_registration: registered {}", user.username);
    Ok(redirect("/"))
}
