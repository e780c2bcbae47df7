mod areas;
mod execute;
mod health;

pub use areas::{area, available_areas};
pub use execute::execute;
pub use health::health;
