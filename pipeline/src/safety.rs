use tracing::warn;

fn same_selector(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Remove the main-content selector from a hide list.
///
/// Runs on every hide list handed to a caller, whatever produced it.
pub fn enforce_main_content_safety(hide_elements: Vec<String>, main_selector: &str) -> Vec<String> {
    let before = hide_elements.len();
    let kept: Vec<String> = hide_elements
        .into_iter()
        .filter(|selector| !same_selector(selector, main_selector))
        .collect();

    if kept.len() != before {
        warn!(
            main_selector,
            removed = before - kept.len(),
            "Stripped main content selector from hide list"
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hide(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_main_selector_removed_case_insensitively() {
        let kept = enforce_main_content_safety(hide(&["nav", "#Main", " #main ", ".ads"]), "#main");
        assert_eq!(kept, hide(&["nav", ".ads"]));
    }

    #[test]
    fn test_unrelated_selectors_untouched() {
        let kept = enforce_main_content_safety(hide(&["main > nav", "aside"]), "main");
        assert_eq!(kept, hide(&["main > nav", "aside"]));
    }
}
