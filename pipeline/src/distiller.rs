//! Reduces raw page descriptions to bounded, deduplicated, role-classified
//! summaries.
//!
//! Every entry point is infallible: a broken element is skipped, a broken
//! page yields an empty result with a recognisable title.

use aura_core::{DistilledData, DistilledElement, DomData, DomElement, ElementRole};
use errors::DistillError;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};
use utils::{normalize_whitespace, truncate_chars};

/// Default cap on each of `summary` and `actions`.
pub const DEFAULT_MAX_ELEMENTS: usize = 40;

/// Longest element text kept after distillation.
pub const MAX_TEXT_CHARS: usize = 200;

/// Title of the result when a structured page could not be read at all.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Title of the result when an HTML document could not be read at all.
pub const HTML_ERROR_TITLE: &str = "Error";

const HTML_ELEMENTS: &str = "h1, h2, h3, h4, h5, h6, p, button, a, input, textarea, select";

struct Accumulator {
    max_elements: usize,
    seen: HashSet<String>,
    data: DistilledData
}

impl Accumulator {
    fn new(title: &str, url: &str, max_elements: usize) -> Self {
        Self {
            max_elements,
            seen: HashSet::new(),
            data: DistilledData::empty(title, url)
        }
    }

    fn push(&mut self, role: ElementRole, raw: &DomElement) {
        let text = normalize_whitespace(&raw.text);
        if text.is_empty() && !role.allows_empty_text() {
            return;
        }
        if !text.is_empty() && !self.seen.insert(text.to_lowercase()) {
            return;
        }

        let list = if role.is_interactive() {
            &mut self.data.actions
        } else {
            &mut self.data.summary
        };
        if list.len() >= self.max_elements {
            return;
        }

        list.push(DistilledElement {
            role,
            text: truncate_chars(&text, MAX_TEXT_CHARS).to_string(),
            selector: raw.selector.clone().filter(|s| !s.trim().is_empty()),
            aria_label: raw.aria_label.clone().filter(|s| !s.trim().is_empty()),
            visible: raw.in_viewport.unwrap_or(false)
        });
    }

    fn finish(self) -> DistilledData {
        debug!(
            url = %self.data.url,
            summary = self.data.summary.len(),
            actions = self.data.actions.len(),
            "Page distilled"
        );
        self.data
    }
}

/// Distill a typed page description in document order.
pub fn distill(page: &DomData, max_elements: usize) -> DistilledData {
    let mut acc = Accumulator::new(&page.title, &page.url, max_elements);
    for element in &page.elements {
        acc.push(ElementRole::classify(&element.role), element);
    }
    acc.finish()
}

/// Distill an untyped JSON page description.
///
/// Elements that cannot be read are skipped individually. A value that is
/// not a page object at all yields an empty result titled "Unknown".
pub fn distill_value(raw: &Value, max_elements: usize) -> DistilledData {
    let Some(page) = raw.as_object() else {
        warn!("Page description is not an object; returning empty distillation");
        return DistilledData::empty(UNKNOWN_TITLE, "");
    };

    let title = page.get("title").and_then(Value::as_str).unwrap_or_default();
    let url = page.get("url").and_then(Value::as_str).unwrap_or_default();

    let elements = match page.get("elements") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            warn!(url, "Page elements are not a list; returning empty distillation");
            return DistilledData::empty(UNKNOWN_TITLE, url);
        }
    };

    let mut acc = Accumulator::new(title, url, max_elements);
    for (index, item) in elements.iter().enumerate() {
        match read_element(index, item) {
            Ok(element) => acc.push(ElementRole::classify(&element.role), &element),
            Err(e) => debug!(url, error = %e, "Skipping element")
        }
    }
    acc.finish()
}

fn read_element(index: usize, item: &Value) -> Result<DomElement, DistillError> {
    if !item.is_object() {
        return Err(DistillError::UnreadableElement {
            index,
            reason: "element is not an object".to_string()
        });
    }
    if item.get("role").is_some_and(|role| !role.is_string() && !role.is_null()) {
        return Err(DistillError::MissingRole { index });
    }

    let mut element: DomElement =
        serde_json::from_value(with_default_role(item)).map_err(|e| {
            DistillError::UnreadableElement {
                index,
                reason: e.to_string()
            }
        })?;
    if element.role.trim().is_empty() {
        element.role = "generic".to_string();
    }
    Ok(element)
}

fn with_default_role(item: &Value) -> Value {
    let mut item = item.clone();
    if let Some(map) = item.as_object_mut() {
        if map.get("role").is_none_or(Value::is_null) {
            map.insert("role".to_string(), Value::String("generic".to_string()));
        }
        if map.get("text").is_some_and(Value::is_null) {
            map.remove("text");
        }
    }
    item
}

/// Distill an HTML document.
///
/// Elements without visible text fall back to `placeholder`, then
/// `aria-label`, then (for selects) the first option. An empty document
/// yields an empty result titled "Error".
pub fn distill_html(html: &str, url: &str, max_elements: usize) -> DistilledData {
    match parse_html(html, url, max_elements) {
        Ok(data) => data,
        Err(e) => {
            warn!(url, error = %e, "HTML distillation failed");
            DistilledData::empty(HTML_ERROR_TITLE, url)
        }
    }
}

fn parse_html(html: &str, url: &str, max_elements: usize) -> Result<DistilledData, DistillError> {
    if html.trim().is_empty() {
        return Err(DistillError::Html {
            reason: "document is empty".to_string()
        });
    }

    let document = Html::parse_document(html);
    let title_selector = selector("title")?;
    let element_selector = selector(HTML_ELEMENTS)?;
    let option_selector = selector("option")?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| normalize_whitespace(&t.text().collect::<String>()))
        .unwrap_or_default();

    let mut acc = Accumulator::new(&title, url, max_elements);
    for node in document.select(&element_selector) {
        let role = ElementRole::classify(node.value().name());
        let element = DomElement {
            role: role.to_string(),
            text: html_text(node, &option_selector),
            selector: Some(html_selector(node)),
            aria_label: node.value().attr("aria-label").map(str::to_string),
            in_viewport: None,
            y: None
        };
        acc.push(role, &element);
    }
    Ok(acc.finish())
}

fn selector(css: &str) -> Result<Selector, DistillError> {
    Selector::parse(css).map_err(|e| DistillError::Html {
        reason: format!("invalid selector {css}: {e}")
    })
}

fn html_text(node: ElementRef<'_>, option_selector: &Selector) -> String {
    let visible = normalize_whitespace(&node.text().collect::<String>());
    if !visible.is_empty() && node.value().name() != "select" {
        return visible;
    }

    let attr = |name: &str| {
        node.value()
            .attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    attr("placeholder")
        .or_else(|| attr("aria-label"))
        .or_else(|| {
            node.select(option_selector)
                .next()
                .map(|option| normalize_whitespace(&option.text().collect::<String>()))
                .filter(|t| !t.is_empty())
        })
        .unwrap_or(visible)
}

fn html_selector(node: ElementRef<'_>) -> String {
    match node.value().id().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("#{id}"),
        None => node.value().name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(elements: Vec<DomElement>) -> DomData {
        DomData {
            title: "Test Page".to_string(),
            url: "https://test.com/".to_string(),
            elements,
            main_selector: None,
            content_summary: None
        }
    }

    #[test]
    fn test_distill_basic() {
        let dom = page(vec![
            DomElement::new("heading", "Hello World").with_selector("h1").visible(),
            DomElement::new("button", "Click Me").with_selector("#btn").visible(),
            DomElement::new("link", "Read More").with_selector("a")
        ]);

        let distilled = distill(&dom, DEFAULT_MAX_ELEMENTS);

        assert_eq!(distilled.title, "Test Page");
        assert_eq!(distilled.summary.len(), 1);
        assert_eq!(distilled.summary[0].text, "Hello World");
        assert_eq!(distilled.actions.len(), 2);
        assert_eq!(distilled.actions[0].role, ElementRole::Button);
        assert!(distilled.actions[0].visible);
        assert_eq!(distilled.actions[1].role, ElementRole::Link);
        assert!(!distilled.actions[1].visible);
    }

    #[test]
    fn test_deduplication_is_case_insensitive_and_page_wide() {
        let dom = page(vec![
            DomElement::new("link", "Home").with_selector("nav1"),
            DomElement::new("link", "home").with_selector("nav2"),
            DomElement::new("text", "HOME"),
            DomElement::new("text", "Unique Text")
        ]);

        let distilled = distill(&dom, DEFAULT_MAX_ELEMENTS);

        assert_eq!(distilled.actions.len(), 1);
        assert_eq!(distilled.actions[0].selector.as_deref(), Some("nav1"));
        assert_eq!(distilled.summary.len(), 1);
        assert_eq!(distilled.summary[0].text, "Unique Text");
    }

    #[test]
    fn test_empty_text_kept_only_for_interactive_roles() {
        let dom = page(vec![
            DomElement::new("p", ""),
            DomElement::new("button", "  ").with_selector("#icon"),
            DomElement::new("input", "").with_selector("#q"),
            DomElement::new("select", "")
        ]);

        let distilled = distill(&dom, DEFAULT_MAX_ELEMENTS);

        assert!(distilled.summary.is_empty());
        assert_eq!(distilled.actions.len(), 2);
        assert_eq!(distilled.actions[0].selector.as_deref(), Some("#icon"));
    }

    #[test]
    fn test_max_elements_caps_each_list() {
        let mut elements: Vec<DomElement> = (0..50)
            .map(|i| DomElement::new("text", format!("Text {i}")))
            .collect();
        elements.extend((0..5).map(|i| DomElement::new("button", format!("Button {i}"))));

        let distilled = distill(&page(elements), 10);

        assert_eq!(distilled.summary.len(), 10);
        assert_eq!(distilled.summary[0].text, "Text 0");
        assert_eq!(distilled.actions.len(), 5);
    }

    #[test]
    fn test_long_text_is_bounded() {
        let dom = page(vec![DomElement::new("text", "word ".repeat(200))]);
        let distilled = distill(&dom, DEFAULT_MAX_ELEMENTS);
        assert_eq!(distilled.summary[0].text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_distill_value_skips_broken_elements() {
        let raw = json!({
            "title": "T",
            "url": "http://t.com",
            "elements": [
                null,
                {"role": 42, "text": "bad role"},
                {"role": "button", "text": ["not", "text"]},
                {"text": "No role given"},
                {"role": "button", "text": "Go", "selector": "#go"}
            ]
        });

        let distilled = distill_value(&raw, DEFAULT_MAX_ELEMENTS);

        assert_eq!(distilled.title, "T");
        assert_eq!(distilled.summary.len(), 1);
        assert_eq!(distilled.summary[0].role, ElementRole::Generic);
        assert_eq!(distilled.actions.len(), 1);
        assert_eq!(distilled.actions[0].text, "Go");
    }

    #[test]
    fn test_distill_value_total_failure() {
        let distilled = distill_value(&Value::Null, DEFAULT_MAX_ELEMENTS);
        assert_eq!(distilled.title, UNKNOWN_TITLE);
        assert!(distilled.is_empty());

        let distilled = distill_value(&json!({"title": "T", "elements": "nope"}), 10);
        assert_eq!(distilled.title, UNKNOWN_TITLE);
    }

    #[test]
    fn test_distill_html_elements() {
        let html = r#"
        <html>
            <head><title>HTML Test</title></head>
            <body>
                <h1>Main Title</h1>
                <p>Some descriptive text about the page.</p>
                <button aria-label="Submit Form">Submit</button>
                <a href="/next">Next Page</a>
                <input type="text" placeholder="Your Name">
            </body>
        </html>
        "#;

        let distilled = distill_html(html, "https://html-test.com/", DEFAULT_MAX_ELEMENTS);

        assert_eq!(distilled.title, "HTML Test");
        assert_eq!(distilled.summary.len(), 2);
        assert!(
            distilled
                .summary
                .iter()
                .any(|el| el.role == ElementRole::Heading && el.text == "Main Title")
        );
        assert_eq!(distilled.actions.len(), 3);
        let button = &distilled.actions[0];
        assert_eq!(button.text, "Submit");
        assert_eq!(button.aria_label.as_deref(), Some("Submit Form"));
        assert!(
            distilled
                .actions
                .iter()
                .any(|el| el.role == ElementRole::Input && el.text == "Your Name")
        );
    }

    #[test]
    fn test_distill_html_fallback_texts_and_selectors() {
        let html = r#"
            <input id="email" type="email" placeholder="email@example.com">
            <textarea aria-label="Message"></textarea>
            <select id="lang"><option>English</option><option>French</option></select>
        "#;

        let distilled = distill_html(html, "https://test.com/", DEFAULT_MAX_ELEMENTS);

        assert_eq!(distilled.actions.len(), 3);
        assert_eq!(distilled.actions[0].text, "email@example.com");
        assert_eq!(distilled.actions[0].selector.as_deref(), Some("#email"));
        assert_eq!(distilled.actions[1].text, "Message");
        assert_eq!(distilled.actions[1].selector.as_deref(), Some("textarea"));
        assert_eq!(distilled.actions[2].role, ElementRole::Select);
        assert_eq!(distilled.actions[2].text, "English");
    }

    #[test]
    fn test_distill_html_without_body() {
        let distilled = distill_html("<html><title>T</title></html>", "http://t.com", 10);
        assert_eq!(distilled.title, "T");
        assert!(distilled.is_empty());
    }

    #[test]
    fn test_distill_html_empty_document() {
        let distilled = distill_html("   ", "http://t.com", 10);
        assert_eq!(distilled.title, HTML_ERROR_TITLE);
        assert_eq!(distilled.url, "http://t.com");
    }
}
