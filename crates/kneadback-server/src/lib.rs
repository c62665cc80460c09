pub mod error;
pub mod handlers;
pub mod server;
pub mod service;

pub use error::{ApiError, ServerError};
pub use server::{bind, router, serve, shutdown_signal, AppState};
pub use service::{IngestError, IngestionService};
