use std::sync::Arc;

use crate::services::AreaService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AreaService>,
}

impl AppState {
    pub fn new(service: AreaService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
