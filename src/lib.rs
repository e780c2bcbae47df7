pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod script;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use error::{AreasError, AreasResult};
pub use services::AreaService;
