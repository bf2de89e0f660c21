//! HTTP client for the generic pricing rule engine that supplies base prices.

use async_trait::async_trait;
use meridian_core::{BasePriceProvider, BasePriceQuote, BasePriceRequest, CoreError, CoreResult};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub struct HttpBasePriceClient {
    client: Client,
    base_url: String,
}

impl HttpBasePriceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/pricing/calculate", self.base_url)
    }
}

#[async_trait]
impl BasePriceProvider for HttpBasePriceClient {
    async fn compute_base_price(&self, request: &BasePriceRequest) -> CoreResult<BasePriceQuote> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-tenant-id", request.tenant_id.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| CoreError::upstream(format!("base pricing request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CoreError::NotFound(format!("article {}", request.article_id))),
            status if status.is_success() => response
                .json::<BasePriceQuote>()
                .await
                .map_err(|e| CoreError::upstream(format!("invalid base pricing response: {}", e))),
            status => {
                tracing::warn!(%status, article_id = %request.article_id, "Base pricing service returned an error");
                Err(CoreError::upstream(format!("base pricing service returned {}", status)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = HttpBasePriceClient::new("http://pricing.internal/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://pricing.internal/v1/pricing/calculate");
    }
}
