pub mod cars;
pub mod comments;
pub mod users;
