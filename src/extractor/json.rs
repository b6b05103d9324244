use super::Extractor;
use crate::config::SourceConfig;
use crate::state::RawEntity;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Extractor reading a JSON document over HTTP
///
/// The three selectors of [`SourceConfig`] are JSON Pointers: one to the
/// item array, and two resolved inside each item for the name and the
/// alert indicator.
pub struct JsonExtractor {
    client: reqwest::Client,
    config: SourceConfig,
}

impl JsonExtractor {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("alertwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Extractor for JsonExtractor {
    fn name(&self) -> &str {
        "json"
    }

    async fn extract(&self) -> Result<Vec<RawEntity>> {
        let response = self
            .client
            .get(&self.config.url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.config.url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Source returned error status {}: {}", status, body);
        }

        let document: Value = response
            .json()
            .await
            .context("Failed to parse source response as JSON")?;

        let entities = select_entities(&document, &self.config)?;
        debug!(url = %self.config.url, entities = entities.len(), "Extracted entities");
        Ok(entities)
    }
}

/// Apply the configured selectors to a parsed document
pub fn select_entities(document: &Value, config: &SourceConfig) -> Result<Vec<RawEntity>> {
    let items = document
        .pointer(&config.item_selector)
        .and_then(Value::as_array)
        .with_context(|| {
            format!(
                "Item selector '{}' does not resolve to an array",
                config.item_selector
            )
        })?;

    let entities = items
        .iter()
        .map(|item| RawEntity {
            name: item
                .pointer(&config.name_selector)
                .map(name_text)
                .unwrap_or_default(),
            alert: item.pointer(&config.alert_selector).is_some_and(is_truthy),
        })
        .collect();

    Ok(entities)
}

fn name_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Whether an alert indicator value counts as present
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
