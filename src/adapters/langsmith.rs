//! LangSmith adapter for uploading accepted items as a dataset.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{DatasetUploader, UploadReceipt};
use crate::config::UploadSettings;
use crate::review::ReviewItem;

/// Dataset uploader backed by the LangSmith REST API
pub struct LangSmithUploader {
    api_key: String,
    endpoint: String,
    web_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CreateDataset<'a> {
    name: &'a str,
    description: &'a str,
    data_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    id: String,
}

/// One dataset example: the query in, the grounding out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub inputs: Value,
    pub outputs: Value,
    pub dataset_id: String,
}

impl Example {
    pub fn from_item(item: &ReviewItem, dataset_id: &str) -> Self {
        Self {
            inputs: json!({ "query": item.query }),
            outputs: json!({
                "citations": item.citations,
                "classification": item.classification,
            }),
            dataset_id: dataset_id.to_string(),
        }
    }
}

impl LangSmithUploader {
    /// Create an uploader from resolved settings; the API key is required
    pub fn from_settings(settings: &UploadSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .context("LANGSMITH_API_KEY not set in environment")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            web_url: settings.web_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn dataset_url(&self, dataset_id: &str) -> String {
        format!("{}/datasets/{}", self.web_url, dataset_id)
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.api_url(path))
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send LangSmith request: {}", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LangSmith API error ({}) on {}: {}", status, path, body.trim());
        }

        Ok(response)
    }
}

#[async_trait]
impl DatasetUploader for LangSmithUploader {
    fn name(&self) -> &str {
        "langsmith"
    }

    async fn upload(&self, name: &str, description: &str, items: &[&ReviewItem]) -> Result<UploadReceipt> {
        let dataset: Dataset = self
            .post(
                "datasets",
                &CreateDataset {
                    name,
                    description,
                    data_type: "kv",
                },
            )
            .await?
            .json()
            .await
            .context("Failed to parse dataset response")?;

        info!(dataset = %dataset.id, name, "Created dataset");

        let examples: Vec<Example> = items
            .iter()
            .map(|item| Example::from_item(item, &dataset.id))
            .collect();

        self.post("examples/bulk", &examples).await?;

        info!(dataset = %dataset.id, count = examples.len(), "Uploaded examples");

        Ok(UploadReceipt {
            url: self.dataset_url(&dataset.id),
            count: examples.len(),
        })
    }
}
