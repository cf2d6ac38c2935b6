pub mod config;
pub mod error;
pub mod state;
pub mod routes;
pub mod handlers;
pub mod middleware;
pub mod app;

pub use app::{build_router, ApiDoc};
pub use config::Config;
pub use state::AppState;
