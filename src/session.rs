//! Browser sessions live in an encrypted cookie. The only identity stored in
//! it is the user id, resolved against the database on every request.

use crate::user::{get_client_user, ClientUser};
use actix_session::Session;
use actix_web::Error;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

const USER_ID_KEY: &str = "user_id";
const COMMENT_FLASH_KEY: &str = "comment_flash";
/// The session lives in a cookie, so only the head of a rejected draft is kept.
pub const FLASH_DRAFT_CHARS: usize = 200;

pub fn get_session_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(USER_ID_KEY) {
        Ok(id) => id,
        Err(e) => {
            log::warn!("get_session_user_id: {}", e);
            None
        }
    }
}

pub async fn authenticate_client_by_session<C: ConnectionTrait>(
    db: &C,
    session: &Session,
) -> Option<ClientUser> {
    let user_id = get_session_user_id(session)?;
    match get_client_user(db, user_id).await {
        Ok(Some(user)) if user.is_active => Some(user),
        Ok(_) => {
            // Deleted or deactivated since login.
            session.remove(USER_ID_KEY);
            None
        }
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

/// Binds the session to `user_id`, issuing a fresh cookie.
pub fn login(session: &Session, user_id: i32) -> Result<(), Error> {
    session.renew();
    session.insert(USER_ID_KEY, user_id)?;
    Ok(())
}

pub fn logout(session: &Session) {
    session.purge();
}

/// A rejected comment, kept until the car page is shown again.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommentFlash {
    pub car_id: i32,
    pub content: String,
    pub errors: Vec<String>,
}

impl CommentFlash {
    pub fn new(car_id: i32, content: &str, errors: Vec<String>) -> Self {
        Self {
            car_id,
            content: content.chars().take(FLASH_DRAFT_CHARS).collect(),
            errors,
        }
    }
}

pub fn set_comment_flash(session: &Session, flash: &CommentFlash) -> Result<(), Error> {
    session.insert(COMMENT_FLASH_KEY, flash)?;
    Ok(())
}

/// Removes the flash and returns it if it belongs to `car_id`.
pub fn take_comment_flash(session: &Session, car_id: i32) -> Option<CommentFlash> {
    let flash = session.remove_as::<CommentFlash>(COMMENT_FLASH_KEY)?;
    match flash {
        Ok(flash) if flash.car_id == car_id => Some(flash),
        Ok(_) => None,
        Err(raw) => {
            log::warn!("take_comment_flash: could not parse {}", raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_draft_is_capped() {
        let draft = "ж".repeat(FLASH_DRAFT_CHARS * 4);
        let flash = CommentFlash::new(1, &draft, vec!["error".to_owned()]);
        assert_eq!(flash.content.chars().count(), FLASH_DRAFT_CHARS);

        let flash = CommentFlash::new(1, "короткий $", Vec::new());
        assert_eq!(flash.content, "короткий $");
    }
}
