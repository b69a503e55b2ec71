//! Page representations: the raw description sent by the browser, the
//! distilled summary used for prompting, and the interaction snapshot.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Selector assumed to hold the primary content when the page declares none.
pub const DEFAULT_MAIN_SELECTOR: &str = "main";

/// Interaction signal names carried in [`PageSnapshot::interaction_stats`].
pub const IDLE_TIME: &str = "idle_time";
pub const SCROLL_LOOPS: &str = "scroll_loops";
pub const RAGE_CLICKS: &str = "rage_clicks";

/// A single scraped element before distillation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomElement {
    pub role: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub in_viewport: Option<bool>,
    #[serde(default)]
    pub y: Option<f64>
}

impl DomElement {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
            selector: None,
            aria_label: None,
            in_viewport: None,
            y: None
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn visible(mut self) -> Self {
        self.in_viewport = Some(true);
        self
    }
}

/// Raw page description from the content script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomData {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub elements: Vec<DomElement>,
    #[serde(default)]
    pub main_selector: Option<String>,
    #[serde(default)]
    pub content_summary: Option<String>
}

impl DomData {
    /// The page's declared main-content selector, or the conventional default.
    pub fn main_content_selector(&self) -> &str {
        self.main_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_MAIN_SELECTOR)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ElementRole {
    Button,
    Link,
    Input,
    Select,
    Heading,
    Text,
    Generic
}

impl ElementRole {
    /// Maps a scraped role or tag name onto the distilled role set.
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "button" => Self::Button,
            "link" | "a" => Self::Link,
            "input" | "textbox" | "textarea" | "searchbox" => Self::Input,
            "select" | "combobox" | "listbox" => Self::Select,
            "heading" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Heading,
            "text" | "p" | "paragraph" => Self::Text,
            _ => Self::Generic
        }
    }

    /// Interactive roles land in `actions`, everything else in `summary`.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Button | Self::Link | Self::Input | Self::Select)
    }

    /// Roles kept even without visible text.
    pub fn allows_empty_text(self) -> bool {
        matches!(self, Self::Button | Self::Link | Self::Input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DistilledElement {
    pub role: ElementRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub visible: bool
}

/// Bounded, deduplicated, role-classified page summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DistilledData {
    pub title: String,
    pub url: String,
    pub summary: Vec<DistilledElement>,
    pub actions: Vec<DistilledElement>
}

impl DistilledData {
    pub fn empty(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            summary: Vec::new(),
            actions: Vec::new()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.actions.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.summary.len() + self.actions.len()
    }
}

/// Per-request view of the page handed to the inference phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageSnapshot {
    pub url: String,
    pub dom_text: String,
    pub dom_structure: String,
    #[serde(default)]
    pub interaction_stats: BTreeMap<String, f64>
}

impl PageSnapshot {
    /// Value of an interaction signal, zero when absent.
    pub fn stat(&self, name: &str) -> f64 {
        self.interaction_stats.get(name).copied().unwrap_or(0.0)
    }

    pub fn structure_size(&self) -> usize {
        self.dom_structure.chars().count()
    }
}
