pub mod app;
pub mod config;
pub mod encode;
pub mod error;
pub mod generate;
pub mod image_io;
pub mod llm;
pub mod logging;
pub mod models;
pub mod routes;
pub mod schema;

pub use app::build_app;
pub use models::AppState;
