pub mod admin;
pub mod api;
pub mod auth;
pub mod car;
pub mod comment;
pub mod config;
pub mod db;
pub mod fixtures;
pub mod frontend;
pub mod init;
pub mod middleware;
pub mod orm;
pub mod permission;
pub mod session;
pub mod template;
pub mod user;
pub mod validators;
pub mod web;

pub use config::Config;
pub use middleware::ClientCtx;
