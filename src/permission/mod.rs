//! Object-level mutation rights for cars and comments.
//!
//! Reads are always allowed. Writes need an authenticated client, and once the
//! target object is loaded, that client must be active and either own the
//! object or be staff.

pub mod error;
pub mod policy;
#[cfg(test)]
mod test;

pub use error::Denial;
pub use policy::{author_or_staff, is_safe_method, owner_or_staff, OwnershipPolicy};
