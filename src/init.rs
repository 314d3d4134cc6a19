use crate::admin::AdminSite;
use crate::auth::jwt::JwtKeys;
use crate::config::Config;
use crate::middleware::ClientCtx;
use crate::{api, web};
use actix_session::config::PersistentSession;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::{time, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::web::{scope, Data};
use actix_web::App;
use env_logger::Env;
use sea_orm::DatabaseConnection;

/// Everything the application shares between workers, built once at startup.
#[derive(Clone)]
pub struct AppData {
    pub db: Data<DatabaseConnection>,
    pub config: Data<Config>,
    pub keys: Data<JwtKeys>,
    pub admin: Data<AdminSite>,
    pub session_key: Key,
}

impl AppData {
    pub fn new(config: Config, db: DatabaseConnection) -> Self {
        Self {
            session_key: Key::derive_from(config.secret_key.as_bytes()),
            keys: Data::new(JwtKeys::from_config(&config)),
            admin: Data::new(AdminSite::default()),
            config: Data::new(config),
            db: Data::new(db),
        }
    }
}

/// Builds the application: JSON API, API docs and the HTML site.
pub fn create_app(
    data: AppData,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session_ttl = time::Duration::seconds(data.config.session_time.num_seconds());

    // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
    // The client context reads the session, so the session wraps it.
    App::new()
        .app_data(data.db.clone())
        .app_data(data.config.clone())
        .app_data(data.keys.clone())
        .app_data(data.admin.clone())
        .wrap(ClientCtx::default())
        .wrap(
            SessionMiddleware::builder(CookieSessionStore::default(), data.session_key.clone())
                .cookie_name("sessionid".to_owned())
                .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
                .build(),
        )
        .wrap(Logger::new("%a %{User-Agent}i"))
        .service(api::scope(scope("/api")))
        .service(scope("/docs").configure(api::docs::configure))
        // Error documents are HTML, so they only apply outside the API.
        .service(
            scope("")
                .wrap(
                    ErrorHandlers::new()
                        .handler(StatusCode::BAD_REQUEST, web::error::render_400)
                        .handler(StatusCode::FORBIDDEN, web::error::render_403)
                        .handler(StatusCode::NOT_FOUND, web::error::render_404)
                        .handler(StatusCode::INTERNAL_SERVER_ERROR, web::error::render_500),
                )
                .configure(web::configure),
        )
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    // A missing .env file is fine; the environment may be set directly.
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
