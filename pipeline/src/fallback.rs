//! Deterministic, profile-aware response used when the model path fails.

use crate::safety::enforce_main_content_safety;
use aura_core::{
    DistilledData, DistilledElement, DomData, ElementRole, LayoutMode, PipelineResult, ResultMode,
    SupportLevel, Theme, UiCommand, UserProfile
};
use utils::{normalize_whitespace, truncate_chars};

const SNIPPET_CHARS: usize = 200;

/// Whether bionic reading suits this profile.
pub fn should_apply_bionic(profile: &UserProfile) -> bool {
    matches!(
        profile.cognitive.support_level,
        SupportLevel::Medium | SupportLevel::High
    ) || profile.cognitive.reduce_distractions
}

fn selectors_with_role(
    actions: &[DistilledElement],
    role: ElementRole,
    limit: usize
) -> Vec<String> {
    actions
        .iter()
        .filter(|el| el.role == role)
        .filter_map(|el| el.selector.clone())
        .take(limit)
        .collect()
}

fn content_snippet(page: &DomData, distilled: &DistilledData) -> String {
    let text = match page.content_summary.as_deref().map(str::trim) {
        Some(summary) if !summary.is_empty() => normalize_whitespace(summary),
        _ => distilled
            .summary
            .iter()
            .map(|el| el.text.as_str())
            .filter(|t| !t.is_empty())
            .take(3)
            .collect::<Vec<_>>()
            .join(" ")
    };
    truncate_chars(&text, SNIPPET_CHARS).to_string()
}

fn explanation(page: &DomData, distilled: &DistilledData, profile: &UserProfile) -> String {
    let site = match page.title.trim() {
        "" => "this website",
        title => title
    };

    if profile.prefers_simple_language() {
        return format!(
            "Aura is helping you navigate {site}. The main actions are easier to reach \
             and extra links are out of the way."
        );
    }

    let snippet = content_snippet(page, distilled);
    let mut text = format!("Detailed Analysis: {site}");
    if !snippet.is_empty() {
        text.push_str(&format!(" presents the following content: {snippet}"));
    }
    text.push_str(
        ". Secondary navigation links have been hidden to reduce visual noise, the primary \
         action is highlighted and the layout has been reorganised around the main content."
    );
    text
}

/// Build the fallback result from the page's distillation and the profile.
///
/// Makes no model call and cannot fail. Hide and highlight targets come only
/// from `distilled.actions`, so duplicates and elements past the cap never
/// reach them. The hide list goes through the same main-content safety
/// filter as model-backed results.
pub fn build_mock(
    page: &DomData,
    distilled: &DistilledData,
    profile: &UserProfile,
    hide_count: usize
) -> PipelineResult {
    let hide = selectors_with_role(&distilled.actions, ElementRole::Link, hide_count);
    let highlight = selectors_with_role(&distilled.actions, ElementRole::Button, 1);

    let layout_mode = if profile.needs_cognitive_support() {
        LayoutMode::Focus
    } else {
        LayoutMode::Simplified
    };

    PipelineResult::ApplyUi {
        mode: ResultMode::MockFallback,
        ui_command: UiCommand {
            layout_mode,
            theme: profile.needs_high_contrast().then_some(Theme::Contrast),
            hide_elements: enforce_main_content_safety(hide, page.main_content_selector()),
            highlight_elements: highlight,
            explanation: explanation(page, distilled, profile),
            visual_validation_required: false,
            bionic_reading: should_apply_bionic(profile)
        },
        primary_goal: None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distiller::{DEFAULT_MAX_ELEMENTS, distill};
    use aura_core::{DomElement, VisionAcuity};

    fn page() -> DomData {
        DomData {
            title: "News Daily".to_string(),
            url: "https://news.test".to_string(),
            elements: vec![
                DomElement::new("link", "Home").with_selector("#home"),
                DomElement::new("link", "Skip to content").with_selector("MAIN"),
                DomElement::new("text", "Storm hits coast").with_selector("p"),
                DomElement::new("link", "Sports").with_selector("#sports"),
                DomElement::new("button", "Subscribe").with_selector("#subscribe"),
                DomElement::new("link", "Weather").with_selector("#weather"),
                DomElement::new("link", "Opinion").with_selector("#opinion"),
                DomElement::new("button", "Share").with_selector("#share")
            ],
            main_selector: None,
            content_summary: None
        }
    }

    fn mock(page: &DomData, profile: &UserProfile, hide_count: usize) -> PipelineResult {
        build_mock(page, &distill(page, DEFAULT_MAX_ELEMENTS), profile, hide_count)
    }

    fn relaxed_profile() -> UserProfile {
        let mut profile = UserProfile::new("user-1");
        profile.cognitive.reduce_distractions = false;
        profile
    }

    #[test]
    fn test_mock_response_shape() {
        let result = mock(&page(), &relaxed_profile(), 3);

        assert_eq!(result.action(), "apply_ui");
        assert_eq!(result.mode(), ResultMode::MockFallback);
        let command = result.ui_command().unwrap();
        assert_eq!(command.hide_elements, vec!["#home", "#sports"]);
        assert_eq!(command.highlight_elements, vec!["#subscribe"]);
        assert_eq!(command.layout_mode, LayoutMode::Simplified);
        assert_eq!(command.theme, None);
        assert!(!command.bionic_reading);
        assert!(command.explanation.contains("News Daily"));
    }

    #[test]
    fn test_main_selector_never_hidden_in_fallback() {
        let result = mock(&page(), &relaxed_profile(), 10);
        let command = result.ui_command().unwrap();
        assert!(
            !command
                .hide_elements
                .iter()
                .any(|s| s.eq_ignore_ascii_case("main"))
        );
        assert_eq!(command.hide_elements.len(), 4);
    }

    #[test]
    fn test_targets_come_from_distilled_actions() {
        let page = DomData {
            title: "News Daily".to_string(),
            url: "https://news.test".to_string(),
            elements: vec![
                DomElement::new("link", "Home").with_selector("#home"),
                DomElement::new("link", "  HOME ").with_selector("#home-again"),
                DomElement::new("button", "Subscribe").with_selector("#subscribe"),
                DomElement::new("link", "Sports").with_selector("#sports"),
                DomElement::new("button", "Share").with_selector("#share")
            ],
            main_selector: None,
            content_summary: None
        };

        let distilled = distill(&page, 2);
        let result = build_mock(&page, &distilled, &relaxed_profile(), 10);

        let command = result.ui_command().unwrap();
        assert_eq!(command.hide_elements, vec!["#home"]);
        assert_eq!(command.highlight_elements, vec!["#subscribe"]);
    }

    #[test]
    fn test_cognitive_profile_gets_focus_and_bionic() {
        let mut profile = relaxed_profile();
        profile.cognitive.support_level = SupportLevel::High;
        profile.sensory.vision_acuity = VisionAcuity::Low;

        let result = mock(&page(), &profile, 3);
        let command = result.ui_command().unwrap();
        assert_eq!(command.layout_mode, LayoutMode::Focus);
        assert_eq!(command.theme, Some(Theme::Contrast));
        assert!(command.bionic_reading);
    }

    #[test]
    fn test_detailed_explanation_when_simple_language_off() {
        let mut profile = relaxed_profile();
        profile.cognitive.simplify_language = false;

        let result = mock(&page(), &profile, 3);
        let explanation = &result.ui_command().unwrap().explanation;
        assert!(explanation.contains("Detailed Analysis"));
        assert!(explanation.contains("Storm hits coast"));

        let simple = mock(&page(), &relaxed_profile(), 3);
        assert!(
            simple
                .ui_command()
                .unwrap()
                .explanation
                .starts_with("Aura is helping you navigate News Daily")
        );
    }

    #[test]
    fn test_should_apply_bionic() {
        let mut profile = relaxed_profile();
        assert!(!should_apply_bionic(&profile));

        profile.cognitive.support_level = SupportLevel::Low;
        assert!(!should_apply_bionic(&profile));

        profile.cognitive.support_level = SupportLevel::Medium;
        assert!(should_apply_bionic(&profile));

        profile.cognitive.support_level = SupportLevel::None;
        profile.cognitive.reduce_distractions = true;
        assert!(should_apply_bionic(&profile));
    }

    #[test]
    fn test_untitled_page() {
        let mut dom = page();
        dom.title = "  ".to_string();
        let result = mock(&dom, &relaxed_profile(), 3);
        assert!(result.ui_command().unwrap().explanation.contains("this website"));
    }
}
