//! Resolution of semantic alert attributes from annotations and labels.

use crate::config::AlertFieldKeys;
use crate::models::Alert;

/// Placeholder shown for attributes no candidate key resolved
pub const NOT_AVAILABLE: &str = "N/A";

/// Return the first non-empty value for `keys`, checking annotations before labels
/// for each key, or `default` when nothing matches.
pub fn find_first_value<'a, K>(alert: &'a Alert, default: &'a str, keys: K) -> &'a str
where
    K: IntoIterator,
    K::Item: AsRef<str>,
{
    keys.into_iter()
        .find_map(|key| alert.lookup(key.as_ref()))
        .unwrap_or(default)
}

/// Attributes resolved for a single alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertFields {
    pub alert_name: String,
    pub project: String,
    /// Raw comma separated address list, possibly empty
    pub notify_emails: String,
    pub grafana_url: String,
    pub runbook_url: String,
    pub description: String,
}

/// Field extractor parameterized by the configured candidate key lists
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    keys: AlertFieldKeys,
}

impl FieldExtractor {
    pub fn new(keys: AlertFieldKeys) -> Self {
        Self { keys }
    }

    pub fn extract(&self, alert: &Alert) -> AlertFields {
        let keys = &self.keys;
        AlertFields {
            alert_name: find_first_value(alert, NOT_AVAILABLE, &keys.alert_name_keys).to_string(),
            project: find_first_value(alert, NOT_AVAILABLE, &keys.project_keys).to_string(),
            notify_emails: find_first_value(alert, "", &keys.notify_emails_keys).to_string(),
            grafana_url: find_first_value(alert, NOT_AVAILABLE, &keys.grafana_url_keys).to_string(),
            runbook_url: find_first_value(alert, NOT_AVAILABLE, &keys.runbook_url_keys).to_string(),
            description: find_first_value(alert, NOT_AVAILABLE, &keys.description_keys).to_string(),
        }
    }
}
