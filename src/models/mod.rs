pub mod area;
pub mod cache;

pub use area::{Area, Dataset};
pub use cache::{CacheStatus, DatasetCache};
