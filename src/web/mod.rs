//! Web API module for Filebox.
//!
//! HTTP endpoints for uploading, listing, downloading and deleting files
//! in the upload directory.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::{AppState, UploadLimits};
pub use router::create_router;
pub use server::WebServer;
