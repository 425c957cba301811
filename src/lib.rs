//! Filebox - a small HTTP file storage service.
//!
//! Files are uploaded over multipart forms, stored flat in a single upload
//! directory under collision-free names, and served back by that name.

pub mod config;
pub mod datetime;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{FileboxError, Result};
pub use file::StorageManager;
pub use web::WebServer;
