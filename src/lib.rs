pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod execute;
pub mod files;
pub mod gateway;
pub mod users;

pub use config::{Config, Mode};
pub use gateway::{build_router, serve, AppState, Gateway};
