//! Bookmarks Module
//!
//! CRUD over the bookmark collection: list, fetch, create, patch and delete,
//! with validation before any write and sanitization on every read. Deleting
//! a bookmark also removes it from every list that references it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bokmerke::bookmark;
//!
//! let app = Router::new()
//!     .nest("/bookmarks", bookmark::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod routes;

pub use routes::routes;
