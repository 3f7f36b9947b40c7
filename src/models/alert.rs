use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Batch of alerts delivered by an Alertmanager webhook receiver
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMessage {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub group_key: String,

    #[serde(default)]
    pub truncated_alerts: u64,

    /// "firing" or "resolved" for the group as a whole
    #[validate(length(min = 1))]
    pub status: String,

    #[serde(default)]
    pub receiver: String,

    #[serde(default)]
    pub group_labels: HashMap<String, String>,

    #[serde(default)]
    pub common_labels: HashMap<String, String>,

    #[serde(default)]
    pub common_annotations: HashMap<String, String>,

    #[serde(rename = "externalURL", default)]
    pub external_url: String,

    #[validate(nested)]
    pub alerts: Vec<Alert>,
}

impl WebhookMessage {
    /// Partition key for the queue: the first alert's fingerprint, empty when absent
    pub fn partition_key(&self) -> &str {
        self.alerts
            .first()
            .map(|alert| alert.fingerprint.as_str())
            .unwrap_or_default()
    }
}

/// A single firing or resolved alert instance
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[validate(length(min = 1))]
    pub status: String,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub annotations: HashMap<String, String>,

    /// RFC 3339 timestamp, kept verbatim so rendering can fall back to it
    #[serde(default)]
    pub starts_at: String,

    #[serde(default)]
    pub ends_at: String,

    #[serde(rename = "generatorURL", default)]
    pub generator_url: String,

    #[serde(default)]
    pub fingerprint: String,
}

impl Alert {
    /// Look up a key in the annotations bag, then the labels bag, ignoring empty values
    pub fn lookup(&self, key: &str) -> Option<&str> {
        [&self.annotations, &self.labels]
            .into_iter()
            .filter_map(|bag| bag.get(key))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }
}
