//! Display formatting for individual card fields.
//!
//! Every helper either succeeds or reports why, leaving the fallback decision
//! to the renderer.

use chrono::DateTime;
use url::Url;

/// Query parameter of a Prometheus graph link holding the alert expression
pub const EXPR_PARAM: &str = "g0.expr";

/// Mention that notifies everyone in the chat
pub const MENTION_ALL: &str = "<at id=all></at>";

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MetricError {
    #[error("invalid generator url: {0}")]
    InvalidUrl(String),

    #[error("generator url has no g0.expr parameter")]
    MissingExpression,
}

/// Format an RFC 3339 timestamp (with or without fractional seconds) for display,
/// keeping the offset it was written in.
pub fn format_time(raw: &str) -> Result<String, chrono::ParseError> {
    let parsed = DateTime::parse_from_rfc3339(raw)?;
    Ok(parsed.format(DISPLAY_TIME_FORMAT).to_string())
}

/// Extract the percent-decoded expression embedded in a generator URL.
///
/// `http://prometheus:9090/graph?g0.expr=up+%3D%3D+0&g0.tab=1` yields `up == 0`.
pub fn parse_expr(generator_url: &str) -> Result<String, MetricError> {
    let url = Url::parse(generator_url).map_err(|e| MetricError::InvalidUrl(e.to_string()))?;

    url.query_pairs()
        .find(|(key, _)| key == EXPR_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or(MetricError::MissingExpression)
}

/// Split a comma separated address list, trimming and dropping empty entries
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

/// One mention per address in order, or the notify-everyone mention when there are none
pub fn mentions(addresses: &[String]) -> String {
    let addresses: Vec<&str> = addresses
        .iter()
        .map(|address| address.trim())
        .filter(|address| !address.is_empty())
        .collect();

    if addresses.is_empty() {
        return MENTION_ALL.to_string();
    }

    addresses
        .iter()
        .map(|address| format!("<at email={}></at>", address))
        .collect()
}
