use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::api::AreaSource;
use crate::config::Config;
use crate::error::{AreasError, AreasResult};
use crate::models::area::Dataset;

/// Client for the BGRID areas API.
pub struct BgridApi {
    client: Client,
    url: String,
    username: String,
    password: String,
}

impl BgridApi {
    pub fn new(config: &Config) -> AreasResult<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            url: config.areas_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch_actual_areas(&self) -> AreasResult<Dataset> {
        debug!("Sending request to {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => {
                debug!("Rate limit hit on {}", self.url);
                return Err(AreasError::RateLimited);
            }
            status => return Err(AreasError::Upstream(status.as_u16())),
        }

        let dataset: Dataset = response.json().await?;
        debug!("Parsed {} areas from response", dataset.len());

        Ok(dataset)
    }
}

#[async_trait]
impl AreaSource for BgridApi {
    async fn fetch_areas(&self) -> AreasResult<Dataset> {
        self.fetch_actual_areas().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_targets_actual_areas() {
        let config = Config::from_lookup(|key| match key {
            "BGRID_USERNAME" => Some("user".to_string()),
            "BGRID_PASSWORD" => Some("secret".to_string()),
            "BGRID_ENDPOINT" => Some("http://localhost:9999/v1/".to_string()),
            _ => None,
        })
        .unwrap();

        let api = BgridApi::new(&config).unwrap();
        assert_eq!(api.url(), "http://localhost:9999/v1/areas/actual");
    }
}
