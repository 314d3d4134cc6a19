use super::Denial;
use crate::orm::{cars, comments};
use crate::user::ClientUser;
use actix_web::http::Method;

/// GET, HEAD and OPTIONS never modify anything.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Grants writes on `T` to the principal returned by `principal_of`, or to staff.
pub struct OwnershipPolicy<T> {
    principal_of: fn(&T) -> i32,
}

impl<T> Clone for OwnershipPolicy<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OwnershipPolicy<T> {}

impl<T> OwnershipPolicy<T> {
    pub const fn new(principal_of: fn(&T) -> i32) -> Self {
        Self { principal_of }
    }

    /// Request level check, run before the object is looked up.
    pub fn has_permission(&self, client: Option<&ClientUser>, method: &Method) -> Result<(), Denial> {
        if is_safe_method(method) || client.is_some() {
            Ok(())
        } else {
            Err(Denial::NotAuthenticated)
        }
    }

    /// Object level check, run once the target exists.
    pub fn has_object_permission(
        &self,
        client: Option<&ClientUser>,
        method: &Method,
        obj: &T,
    ) -> Result<(), Denial> {
        if is_safe_method(method) {
            return Ok(());
        }
        let client = client.ok_or(Denial::NotAuthenticated)?;
        // Request authentication already refuses inactive accounts.
        if !client.is_active {
            return Err(Denial::PermissionDenied);
        }
        if client.is_staff || client.id == (self.principal_of)(obj) {
            Ok(())
        } else {
            Err(Denial::PermissionDenied)
        }
    }

    /// Both checks in order.
    pub fn check(&self, client: Option<&ClientUser>, method: &Method, obj: &T) -> Result<(), Denial> {
        self.has_permission(client, method)?;
        self.has_object_permission(client, method, obj)
    }
}

fn car_owner(car: &cars::Model) -> i32 {
    car.owner_id
}

fn comment_author(comment: &comments::Model) -> i32 {
    comment.author_id
}

pub const fn owner_or_staff() -> OwnershipPolicy<cars::Model> {
    OwnershipPolicy::new(car_owner)
}

pub const fn author_or_staff() -> OwnershipPolicy<comments::Model> {
    OwnershipPolicy::new(comment_author)
}
