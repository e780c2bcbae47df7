pub mod bgrid;

use async_trait::async_trait;

use crate::error::AreasResult;
use crate::models::area::Dataset;

pub use bgrid::BgridApi;

/// Where the areas dataset comes from. The HTTP client implements it in
/// production; tests plug in fixed datasets.
#[async_trait]
pub trait AreaSource: Send + Sync {
    async fn fetch_areas(&self) -> AreasResult<Dataset>;
}
