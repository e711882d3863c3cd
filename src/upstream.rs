use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::AppResult;
use crate::gate::{ForwardRequest, ForwardResponse, Upstream};

/// Forwards gated requests with reqwest.
///
/// Redirects are handed back to the browser untouched, the same as every
/// other upstream response.
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, request: ForwardRequest) -> AppResult<ForwardResponse> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ForwardResponse {
            status,
            headers,
            body,
        })
    }
}
