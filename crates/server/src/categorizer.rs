//! HTTP client of the categorization service.

use std::time::Duration;

use api_types::{
    categorize::{CategorizeRequest, CategorizeResponse},
    transaction::TransactionKind,
};
use reqwest::{Client, StatusCode};

/// Category used whenever the service cannot answer.
pub(crate) const FALLBACK_CATEGORY: &str = "Other";

#[derive(Debug, thiserror::Error)]
enum CategorizeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
}

#[derive(Clone, Debug)]
pub(crate) struct CategorizerClient {
    client: Client,
    base_url: String,
}

impl CategorizerClient {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Asks the service for a category, falling back to
    /// [`FALLBACK_CATEGORY`] on any failure.
    pub(crate) async fn categorize(
        &self,
        merchant: &str,
        description: Option<&str>,
        amount_minor: i64,
        kind: TransactionKind,
    ) -> String {
        let request = CategorizeRequest {
            merchant: merchant.to_string(),
            amount_minor,
            description: description.map(str::to_string),
            kind,
        };
        match self.request(&request).await {
            Ok(category) => category,
            Err(err) => {
                tracing::warn!(merchant, "categorizer unavailable, using fallback: {err}");
                FALLBACK_CATEGORY.to_string()
            }
        }
    }

    async fn request(&self, request: &CategorizeRequest) -> Result<String, CategorizeError> {
        let resp = self
            .client
            .post(format!("{}/categorize", self.base_url))
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CategorizeError::Status(status));
        }
        Ok(resp.json::<CategorizeResponse>().await?.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let client =
            CategorizerClient::new("http://127.0.0.1:1/", Duration::from_millis(200)).unwrap();
        let category = client
            .categorize("Tesco", None, 10_00, TransactionKind::Debit)
            .await;
        assert_eq!(category, FALLBACK_CATEGORY);
    }

    #[tokio::test]
    async fn answers_from_the_service() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(::categorizer::run_with_listener(listener));

        let client =
            CategorizerClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let category = client
            .categorize("Tesco", Some("weekly shop"), 45_00, TransactionKind::Debit)
            .await;
        assert_eq!(category, "Shopping");
    }
}
