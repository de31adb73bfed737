//! Network seam between the dashboard and its data source.

use std::future::Future;
use std::time::Duration;

use crate::config::DashConfig;
use crate::error::TransportError;
use crate::model::MutationRequest;

/// Everything the dashboard needs from the network.
///
/// Bodies are returned as received; parsing belongs to the caller so that a
/// malformed payload is reported the same way regardless of transport.
pub trait Transport {
    /// POST an empty JSON object to the poll endpoint.
    fn fetch_metrics(&self) -> impl Future<Output = Result<String, TransportError>>;

    fn submit_mutation(
        &self,
        request: &MutationRequest,
    ) -> impl Future<Output = Result<String, TransportError>>;

    /// GET raw image bytes.
    fn fetch_image(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>>;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    poll_url: String,
    mutate_url: String,
}

impl HttpTransport {
    pub fn new(config: &DashConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("livedash/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            poll_url: config.poll_url(),
            mutate_url: config.mutate_url(),
        })
    }

    pub fn poll_url(&self) -> &str {
        &self.poll_url
    }

    fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl Transport for HttpTransport {
    async fn fetch_metrics(&self) -> Result<String, TransportError> {
        log::debug!("POST {}", self.poll_url);
        let response = self
            .http
            .post(&self.poll_url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Ok(Self::expect_ok(response)?.text().await?)
    }

    async fn submit_mutation(&self, request: &MutationRequest) -> Result<String, TransportError> {
        log::debug!("POST {} {:?}", self.mutate_url, request);
        let response = self.http.post(&self.mutate_url).json(request).send().await?;
        Ok(Self::expect_ok(response)?.text().await?)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        log::debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        let bytes = Self::expect_ok(response)?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
