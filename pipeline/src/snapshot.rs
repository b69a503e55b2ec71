use aura_core::{DistilledData, DomData, PageSnapshot};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct Structure<'a> {
    summary: &'a [aura_core::DistilledElement],
    actions: &'a [aura_core::DistilledElement]
}

/// Build the per-request snapshot the gate and the phases work from.
///
/// `dom_text` is the page's content summary, or its title when absent.
/// `dom_structure` is the JSON of the distilled element lists.
pub fn build_snapshot(
    page: &DomData,
    distilled: &DistilledData,
    interaction_stats: BTreeMap<String, f64>
) -> PageSnapshot {
    let dom_text = page
        .content_summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&page.title)
        .to_string();

    let structure = Structure {
        summary: &distilled.summary,
        actions: &distilled.actions
    };
    // Serializing plain strings and enums cannot fail.
    let dom_structure = serde_json::to_string(&structure).unwrap_or_default();

    PageSnapshot {
        url: page.url.clone(),
        dom_text,
        dom_structure,
        interaction_stats
    }
}
