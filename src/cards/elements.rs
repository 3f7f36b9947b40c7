//! Serde model of the Lark interactive card JSON.

use super::CardActionPayload;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LarkCard {
    pub config: CardConfig,
    pub header: CardHeader,
    pub elements: Vec<CardElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardConfig {
    pub wide_screen_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardHeader {
    pub title: PlainText,
    pub template: HeaderTemplate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeaderTemplate {
    Red,
    Green,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlainText {
    pub tag: String,
    pub content: String,
}

impl PlainText {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            tag: "plain_text".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum CardElement {
    ColumnSet {
        flex_mode: String,
        background_style: String,
        columns: Vec<Column>,
    },
    Action {
        actions: Vec<Button>,
    },
}

impl CardElement {
    /// A row of equally weighted markdown columns
    pub fn markdown_row<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CardElement::ColumnSet {
            flex_mode: "none".to_string(),
            background_style: "default".to_string(),
            columns: contents.into_iter().map(Column::markdown).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub tag: String,
    pub width: String,
    pub weight: u32,
    pub vertical_align: String,
    pub elements: Vec<Markdown>,
}

impl Column {
    fn markdown(content: impl Into<String>) -> Self {
        Self {
            tag: "column".to_string(),
            width: "weighted".to_string(),
            weight: 1,
            vertical_align: "top".to_string(),
            elements: vec![Markdown::new(content)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Markdown {
    pub tag: String,
    pub content: String,
}

impl Markdown {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            tag: "markdown".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Button {
    pub tag: String,
    pub text: PlainText,
    #[serde(rename = "type")]
    pub button_type: String,
    pub value: CardActionPayload,
}

impl Button {
    pub fn primary(label: impl Into<String>, value: CardActionPayload) -> Self {
        Self {
            tag: "button".to_string(),
            text: PlainText::new(label),
            button_type: "primary".to_string(),
            value,
        }
    }
}
