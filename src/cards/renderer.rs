use super::elements::{Button, CardConfig, CardElement, CardHeader, HeaderTemplate, LarkCard, PlainText};
use super::format::{format_time, mentions, parse_expr, split_addresses};
use crate::models::Alert;
use crate::processing::AlertFields;
use serde::{Deserialize, Serialize};
use tracing::warn;

const FIRING_ICON: &str = "🚨";
const RESOLVED_ICON: &str = "✅";

/// Discriminant carried by the firing card's resolve button
pub const RESOLVE_ACTION: &str = "resolve";

/// Kind of action a decoded payload asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Resolve,
    Unknown,
}

/// Snapshot embedded in the firing card's button; enough to render the resolved
/// card without the original alert. Missing fields decode as empty so other
/// action kinds can carry smaller values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CardActionPayload {
    pub title: String,
    pub project: String,
    /// Raw start time as received, before display formatting
    pub time: String,
    pub grafana_url: String,
    pub runbook_url: String,
    /// Raw generator URL, before expression extraction
    pub metric: String,
    pub description: String,
    pub action: String,
}

impl CardActionPayload {
    pub fn kind(&self) -> ActionKind {
        if self.action == RESOLVE_ACTION {
            ActionKind::Resolve
        } else {
            ActionKind::Unknown
        }
    }
}

/// Card ready to be posted or used to replace an existing message
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedCard {
    Firing(LarkCard),
    Resolved(LarkCard),
}

impl RenderedCard {
    pub fn card(&self) -> &LarkCard {
        match self {
            RenderedCard::Firing(card) | RenderedCard::Resolved(card) => card,
        }
    }

    pub fn title(&self) -> &str {
        &self.card().header.title.content
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenderedCard::Firing(_) => "firing",
            RenderedCard::Resolved(_) => "resolved",
        }
    }

    /// The action payload of the firing card's button, if any
    pub fn action_payload(&self) -> Option<&CardActionPayload> {
        self.card().elements.iter().find_map(|element| match element {
            CardElement::Action { actions } => actions.first().map(|button| &button.value),
            _ => None,
        })
    }

    /// Serialized card content as the open platform expects it
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self.card())
    }
}

/// Alert attributes in the shape the card layout needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCard {
    pub title: String,
    pub project: String,
    pub time: String,
    pub grafana_url: String,
    pub runbook_url: String,
    pub assign_emails: Vec<String>,
    pub metric: String,
    pub description: String,
}

impl AlertCard {
    pub fn new(alert: &Alert, fields: AlertFields) -> Self {
        Self {
            title: fields.alert_name,
            project: fields.project,
            time: alert.starts_at.clone(),
            grafana_url: fields.grafana_url,
            runbook_url: fields.runbook_url,
            assign_emails: split_addresses(&fields.notify_emails),
            metric: alert.generator_url.clone(),
            description: fields.description,
        }
    }

    pub fn action_payload(&self) -> CardActionPayload {
        CardActionPayload {
            title: self.title.clone(),
            project: self.project.clone(),
            time: self.time.clone(),
            grafana_url: self.grafana_url.clone(),
            runbook_url: self.runbook_url.clone(),
            metric: self.metric.clone(),
            description: self.description.clone(),
            action: RESOLVE_ACTION.to_string(),
        }
    }

    /// Red card with a resolve button
    pub fn render_firing(&self) -> RenderedCard {
        let mut elements = self.body(false);
        elements.push(CardElement::Action {
            actions: vec![Button::primary("Resolved", self.action_payload())],
        });

        RenderedCard::Firing(LarkCard {
            config: CardConfig { wide_screen_mode: true },
            header: CardHeader {
                title: PlainText::new(format!("{} {}", FIRING_ICON, self.title)),
                template: HeaderTemplate::Red,
            },
            elements,
        })
    }

    /// Green card with a status line and no actions
    pub fn render_resolved(&self) -> RenderedCard {
        RenderedCard::Resolved(LarkCard {
            config: CardConfig { wide_screen_mode: true },
            header: CardHeader {
                title: PlainText::new(format!("{} {}", RESOLVED_ICON, self.title)),
                template: HeaderTemplate::Green,
            },
            elements: self.body(true),
        })
    }

    fn body(&self, resolved: bool) -> Vec<CardElement> {
        let mut rows = vec![
            CardElement::markdown_row([
                format!("**📦 Project:**\n{}", self.project),
                format!("**🕐 Time:**\n{}", self.display_time()),
            ]),
            CardElement::markdown_row([
                format!("**🔗 Grafana: **\n{}", self.grafana_url),
                format!("**📘 Runbook: **\n{}", self.runbook_url),
            ]),
            CardElement::markdown_row([format!(
                "**👤 Assigned to: **\n{}",
                mentions(&self.assign_emails)
            )]),
        ];

        if resolved {
            rows.push(CardElement::markdown_row([format!(
                "**📌 Status:**\n{} Resolved",
                RESOLVED_ICON
            )]));
        }

        rows.push(CardElement::markdown_row([format!(
            "**📊 Metric: **\n```\n{}\n```",
            self.display_metric()
        )]));
        rows.push(CardElement::markdown_row([format!(
            "**👉 Description: **\n{}",
            self.description
        )]));
        rows
    }

    fn display_time(&self) -> String {
        format_time(&self.time).unwrap_or_else(|e| {
            warn!(time = %self.time, error = %e, "Failed to parse alert time, showing raw value");
            self.time.clone()
        })
    }

    fn display_metric(&self) -> String {
        parse_expr(&self.metric).unwrap_or_else(|e| {
            warn!(metric = %self.metric, error = %e, "Failed to extract expression, showing generator url");
            self.metric.clone()
        })
    }
}

impl From<&CardActionPayload> for AlertCard {
    fn from(payload: &CardActionPayload) -> Self {
        Self {
            title: payload.title.clone(),
            project: payload.project.clone(),
            time: payload.time.clone(),
            grafana_url: payload.grafana_url.clone(),
            runbook_url: payload.runbook_url.clone(),
            assign_emails: Vec::new(),
            metric: payload.metric.clone(),
            description: payload.description.clone(),
        }
    }
}

/// Render the resolved card for a decoded action payload
pub fn render_resolved(payload: &CardActionPayload) -> RenderedCard {
    AlertCard::from(payload).render_resolved()
}
