use aura_core::{DomData, DomElement, SupportLevel, UserProfile, VisionAcuity};
use providers::{MockProvider, MockReply};
use serde_json::json;

/// Prompt markers identifying each phase in scripted providers.
pub const ASSESSMENT_PHASE: &str = "Phase: assessment";
pub const ADAPTATION_PHASE: &str = "Phase: adaptation";
pub const JUDGE_PHASE: &str = "Phase: judge";
pub const VISION_PHASE: &str = "Phase: vision";

pub const MAIN_SELECTOR: &str = "#main-content";

/// Profile asking for no cognitive support and no distraction reduction.
pub fn relaxed_profile() -> UserProfile {
    let mut profile = UserProfile::new(crate::unique_aura_id());
    profile.cognitive.reduce_distractions = false;
    profile
}

pub fn cognitive_profile() -> UserProfile {
    let mut profile = UserProfile::new(crate::unique_aura_id());
    profile.cognitive.support_level = SupportLevel::High;
    profile.cognitive.simplify_language = true;
    profile
}

pub fn low_vision_profile() -> UserProfile {
    let mut profile = relaxed_profile();
    profile.sensory.vision_acuity = VisionAcuity::Low;
    profile.sensory.high_contrast = true;
    profile
}

/// News article with navigation clutter and a declared main container.
pub fn news_page() -> DomData {
    DomData {
        title: "Daily Courier".to_string(),
        url: "https://courier.test/storm".to_string(),
        elements: vec![
            DomElement::new("link", "Home").with_selector("#nav-home").visible(),
            DomElement::new("link", "World").with_selector("#nav-world").visible(),
            DomElement::new("link", "Sport").with_selector("#nav-sport"),
            DomElement::new("heading", "Storm reaches the coast")
                .with_selector("h1")
                .visible(),
            DomElement::new("text", "Residents are advised to stay indoors tonight.")
                .with_selector("#lede")
                .visible(),
            DomElement::new("button", "Subscribe").with_selector("#subscribe"),
            DomElement::new("button", "Share").with_selector("#share")
        ],
        main_selector: Some(MAIN_SELECTOR.to_string()),
        content_summary: Some("News article about a storm reaching the coast".to_string())
    }
}

/// Small page showing no sign of difficulty.
pub fn quiet_page() -> DomData {
    DomData {
        title: "About".to_string(),
        url: "https://quiet.test/about".to_string(),
        elements: vec![
            DomElement::new("heading", "About us").with_selector("h1"),
            DomElement::new("button", "Contact").with_selector("#contact")
        ],
        main_selector: None,
        content_summary: None
    }
}

/// Page whose distilled structure is well over the default 10,000
/// character gate threshold.
pub fn large_page() -> DomData {
    let filler = "lorem ipsum dolor sit amet ".repeat(6);
    let mut page = quiet_page();
    page.url = "https://large.test".to_string();
    for i in 0..40 {
        page.elements
            .push(DomElement::new("text", format!("Paragraph {i} {filler}")));
        page.elements.push(
            DomElement::new("link", format!("Link {i} {filler}")).with_selector(format!("#link-{i}"))
        );
    }
    page
}

pub fn assessment_json(risk_level: &str, complexity_score: u8, confidence: f64) -> String {
    json!({
        "risk_level": risk_level,
        "issues": ["Dense navigation"],
        "complexity_score": complexity_score,
        "primary_goal": "Read the storm article",
        "confidence": confidence
    })
    .to_string()
}

pub fn adaptation_json(hide_elements: &[&str], confidence: f64) -> String {
    json!({
        "overloaded": true,
        "layout_mode": "focus",
        "theme": "contrast",
        "hide_elements": hide_elements,
        "highlight_elements": ["#subscribe"],
        "explanation": "This is a news article about a storm. Navigation links are hidden.",
        "confidence": confidence
    })
    .to_string()
}

pub fn judge_json(success: bool, reasons: &[&str]) -> String {
    json!({
        "success": success,
        "reasons": reasons,
        "confidence": 0.9
    })
    .to_string()
}

pub fn vision_json(success: bool, recommendation: &str) -> String {
    json!({
        "success": success,
        "improvement_score": 0.7,
        "new_issues": [],
        "recommendation": recommendation,
        "explanation": "Text is easier to read"
    })
    .to_string()
}

/// Provider answering each pipeline phase with the given reply.
pub fn scripted_provider(
    assessment: impl Into<MockReply>,
    adaptation: impl Into<MockReply>,
    judge: impl Into<MockReply>
) -> MockProvider {
    MockProvider::new()
        .with_reply(ASSESSMENT_PHASE, assessment)
        .with_reply(ADAPTATION_PHASE, adaptation)
        .with_reply(JUDGE_PHASE, judge)
}

/// Provider whose phases all succeed with high confidence.
pub fn happy_provider() -> MockProvider {
    scripted_provider(
        assessment_json("high", 6, 0.9),
        adaptation_json(&["#nav-home", "#nav-world"], 0.95),
        judge_json(true, &[])
    )
}
