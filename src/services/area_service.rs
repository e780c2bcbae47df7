use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{AreaSource, BgridApi};
use crate::config::Config;
use crate::error::AreasResult;
use crate::models::area::{Area, Dataset};
use crate::models::cache::{CacheStatus, DatasetCache};
use crate::script;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub status: String,
    pub result: Value,
}

/// Queries over the cached areas dataset.
pub struct AreaService {
    cache: DatasetCache,
    script_max_len: usize,
}

impl AreaService {
    pub fn new(source: Arc<dyn AreaSource>, config: &Config) -> Self {
        Self {
            cache: DatasetCache::new(source, config.cache_ttl),
            script_max_len: config.script_max_len,
        }
    }

    /// Service backed by the live BGRID API.
    pub fn from_config(config: &Config) -> AreasResult<Self> {
        let api = BgridApi::new(config)?;
        Ok(Self::new(Arc::new(api), config))
    }

    /// Fetches the dataset now rather than on the first request.
    pub async fn warm_up(&self) -> AreasResult<Arc<Dataset>> {
        self.cache.refresh().await
    }

    pub async fn available_area_names(&self) -> AreasResult<Vec<String>> {
        let dataset = self.cache.get().await?;
        let names = dataset.available_names();
        debug!("{} of {} areas available", names.len(), dataset.len());
        Ok(names)
    }

    pub async fn area(&self, area_id: i64) -> AreasResult<Vec<Area>> {
        let dataset = self.cache.get().await?;
        Ok(dataset.by_id(area_id))
    }

    pub async fn execute(&self, request: ExecuteRequest) -> AreasResult<ExecuteResponse> {
        let dataset = self.cache.get().await?;
        info!("Executing script for query: {}", request.query);
        debug!("Script source:\n{}", request.code);

        let result = script::execute(&request.code, &dataset, self.script_max_len)?;
        debug!("Script result: {}", result);

        Ok(ExecuteResponse {
            status: request.query,
            result,
        })
    }

    pub fn cache_status(&self) -> Option<CacheStatus> {
        self.cache.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AreasError;
    use crate::script::ScriptError;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedSource(Value);

    #[async_trait]
    impl AreaSource for FixedSource {
        async fn fetch_areas(&self) -> AreasResult<Dataset> {
            Ok(serde_json::from_value(self.0.clone()).expect("fixture parses"))
        }
    }

    fn service() -> AreaService {
        let config = Config::from_lookup(|key| match key {
            "BGRID_USERNAME" | "BGRID_PASSWORD" => Some("x".to_string()),
            "BGRID_ENDPOINT" => Some("http://unused.invalid/".to_string()),
            "SCRIPT_MAX_LEN" => Some("256".to_string()),
            _ => None,
        })
        .unwrap();
        let source = FixedSource(json!({
            "data": [
                {"area_id": 10, "area_name": "North Wing", "occupancy": "available"},
                {"area_id": 11, "area_name": "South Wing", "occupancy": "occupied"},
                {"area_id": 12, "area_name": "Atrium", "occupancy": "available"}
            ]
        }));
        AreaService::new(Arc::new(source), &config)
    }

    #[tokio::test]
    async fn test_available_area_names() {
        let names = service().available_area_names().await.unwrap();
        assert_eq!(names, vec!["North Wing", "Atrium"]);
    }

    #[tokio::test]
    async fn test_area_lookup() {
        let service = service();
        let rows = service.area(11).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].area_name, "South Wing");
        assert!(service.area(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_echoes_query_as_status() {
        let response = service()
            .execute(ExecuteRequest {
                code: "output = areas | count_by occupancy".to_string(),
                query: "how busy is it".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, "how busy is it");
        assert_eq!(response.result, json!({"available": 2, "occupied": 1}));
    }

    #[tokio::test]
    async fn test_execute_respects_length_limit() {
        let err = service()
            .execute(ExecuteRequest {
                code: format!("output = '{}'", "a".repeat(300)),
                query: "long".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AreasError::Script(ScriptError::TooLong { max: 256, .. })));
    }
}
