use crate::auth::authenticate_client_by_token;
use crate::auth::jwt::JwtKeys;
use crate::session::authenticate_client_by_session;
use crate::user::ClientUser;
use actix_session::SessionExt;
use actix_utils::future::{ok, Ready};
use actix_web::dev::{
    forward_ready, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{FutureExt as _, LocalBoxFuture};
use sea_orm::DatabaseConnection;
use std::time::{Duration, Instant};
use std::{cell::RefCell, rc::Rc};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    pub client: Option<ClientUser>,
    /// A bearer token was presented but could not be accepted.
    pub token_error: bool,
    pub request_start: Instant,
}

impl ClientCtxInner {
    fn new() -> Self {
        Self {
            client: None,
            token_error: false,
            request_start: Instant::now(),
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Rc<RefCell<ClientCtxInner>>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(ClientCtxInner::new())))
    }
}

impl ClientCtx {
    pub(crate) fn get_client_ctx(extensions: &mut Extensions) -> Self {
        match extensions.get::<Rc<RefCell<ClientCtxInner>>>() {
            // Existing record in extensions; pull it.
            Some(s_impl) => Self(Rc::clone(s_impl)),
            // No existing record; create and insert it.
            None => {
                let inner = Rc::new(RefCell::new(ClientCtxInner::new()));
                extensions.insert(inner.clone());
                Self(inner)
            }
        }
    }

    pub fn get_user(&self) -> Option<ClientUser> {
        self.0.borrow().client.to_owned()
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.borrow().client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.borrow().client {
            Some(user) => user.username.to_owned(),
            None => "Гость".to_owned(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.0.borrow().client.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.0
            .borrow()
            .client
            .as_ref()
            .map(|u| u.is_active && u.is_staff)
            .unwrap_or(false)
    }

    pub fn has_token_error(&self) -> bool {
        self.0.borrow().token_error
    }

    /// Only the owner may edit a car from the site.
    pub fn can_update_car(&self, owner_id: i32) -> bool {
        self.get_id() == Some(owner_id)
    }

    /// The owner or a superuser may delete a car from the site.
    pub fn can_delete_car(&self, owner_id: i32) -> bool {
        match &self.0.borrow().client {
            Some(user) => user.id == owner_id || user.is_superuser,
            None => false,
        }
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.borrow().request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ok(ClientCtx::get_client_ctx(&mut req.extensions_mut()))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ClientCtxMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ClientCtxMiddleware {
            service: Rc::new(service),
        })
    }
}

/// Returns the credentials of an `Authorization: Bearer` header, if one is present.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if scheme.eq_ignore_ascii_case("Bearer") {
        Some(token.trim().to_owned())
    } else {
        None
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let ctx = ClientCtx::get_client_ctx(&mut req.extensions_mut());
        let db = req.app_data::<Data<DatabaseConnection>>().cloned();
        let keys = req.app_data::<Data<JwtKeys>>().cloned();
        let token = bearer_token(req.headers());
        let session = req.get_session();

        async move {
            match db {
                Some(db) => {
                    // A bearer token takes precedence over the session cookie.
                    let (client, token_error) = match (token, keys) {
                        (Some(token), Some(keys)) => {
                            match authenticate_client_by_token(db.get_ref(), &keys, &token).await {
                                Some(client) => (Some(client), false),
                                None => (None, true),
                            }
                        }
                        (Some(_), None) => {
                            log::error!("ClientCtxMiddleware: bearer token sent but no JwtKeys registered.");
                            (None, true)
                        }
                        (None, _) => (authenticate_client_by_session(db.get_ref(), &session).await, false),
                    };

                    let mut inner = ctx.0.borrow_mut();
                    inner.client = client;
                    inner.token_error = token_error;
                }
                None => {
                    log::error!("ClientCtxMiddleware: no database connection available through web server.");
                }
            }

            service.call(req).await
        }
        .boxed_local()
    }
}
