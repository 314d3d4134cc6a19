pub mod jwt;
pub mod password;

use crate::orm::users;
use crate::user::{find_by_username, get_client_user, ClientUser};
use sea_orm::{ConnectionTrait, DbErr};

/// Returns the active user matching both username and password.
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<users::Model>, DbErr> {
    let user = match find_by_username(db, username.trim()).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    if !user.is_active {
        log::warn!("authenticate: inactive account {}", user.username);
        return Ok(None);
    }

    if password::verify_password(password, &user.password) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Resolves an access token to its active user. Any failure yields None.
pub async fn authenticate_client_by_token<C: ConnectionTrait>(
    db: &C,
    keys: &jwt::JwtKeys,
    token: &str,
) -> Option<ClientUser> {
    let claims = match keys.verify_access(token) {
        Ok(claims) => claims,
        Err(e) => {
            log::debug!("authenticate_client_by_token: {}", e);
            return None;
        }
    };

    match get_client_user(db, claims.user_id).await {
        Ok(Some(user)) if user.is_active => Some(user),
        Ok(Some(user)) => {
            log::warn!("authenticate_client_by_token: inactive account {}", user.username);
            None
        }
        Ok(None) => {
            log::warn!(
                "authenticate_client_by_token: token for missing user {}",
                claims.user_id
            );
            None
        }
        Err(e) => {
            log::error!("authenticate_client_by_token: {}", e);
            None
        }
    }
}
