mod handlers;
mod router;
mod serve;
mod state;

pub use router::build_router;
pub use serve::{serve, ServeConfig};
pub use state::AppState;
