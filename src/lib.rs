pub mod api;
pub mod auth;
pub mod bookmark;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod list;
pub mod model;
pub mod sanitize;
pub mod validate;
