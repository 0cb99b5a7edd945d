//! Read-only views over [`SiteState`].
//!
//! Field paths use the recased names (`betterFeaturedImage.sourceUrl`).

use crate::actions::{FETCH_ALL_MEDIA, FETCH_POSTS};
use crate::entities::kinds;
use crate::types::SiteState;
use serde_json::Value;

/// Cached page record
#[must_use]
pub fn page_detail(state: &SiteState, id: u64) -> Option<&Value> {
    state.cache.get(kinds::PAGES, &id.to_string())
}

/// Whether opening page `id` should fetch it
///
/// Id `0` stands for "no page" and never triggers a fetch.
#[must_use]
pub fn needs_page(state: &SiteState, id: u64) -> bool {
    id != 0 && page_detail(state, id).is_none()
}

fn page_str<'a>(state: &'a SiteState, id: u64, pointer: &str) -> Option<&'a str> {
    page_detail(state, id)
        .and_then(|page| page.pointer(pointer))
        .and_then(Value::as_str)
}

/// Rendered page title
#[must_use]
pub fn page_title(state: &SiteState, id: u64) -> Option<&str> {
    page_str(state, id, "/title/rendered")
}

/// Page subtitle set by the subtitles plugin
#[must_use]
pub fn page_subtitle(state: &SiteState, id: u64) -> Option<&str> {
    page_str(state, id, "/wpsSubtitle").filter(|subtitle| !subtitle.is_empty())
}

/// Rendered page body
#[must_use]
pub fn page_content(state: &SiteState, id: u64) -> Option<&str> {
    page_str(state, id, "/content/rendered")
}

/// Page slug
#[must_use]
pub fn page_slug(state: &SiteState, id: u64) -> Option<&str> {
    page_str(state, id, "/slug")
}

/// Hero image of a page
#[must_use]
pub fn featured_image_url(state: &SiteState, id: u64) -> Option<&str> {
    page_str(state, id, "/betterFeaturedImage/sourceUrl")
}

/// Posts of the latest list call, in response order
#[must_use]
pub fn posts(state: &SiteState) -> Vec<&Value> {
    listed(state, FETCH_POSTS, kinds::POSTS)
}

/// Cached post record
#[must_use]
pub fn post(state: &SiteState, id: u64) -> Option<&Value> {
    state.cache.get(kinds::POSTS, &id.to_string())
}

/// Media of the latest library call, in response order
#[must_use]
pub fn media(state: &SiteState) -> Vec<&Value> {
    listed(state, FETCH_ALL_MEDIA, kinds::MEDIA)
}

fn listed<'a>(state: &'a SiteState, family: &str, kind: &str) -> Vec<&'a Value> {
    state
        .cache
        .listing(family)
        .iter()
        .filter_map(|id| state.cache.get(kind, id))
        .collect()
}

/// Whether a call of `family` is outstanding
#[must_use]
pub fn is_loading(state: &SiteState, family: &str) -> bool {
    state.status.is_loading(family)
}

/// Last unsuppressed failure of `family`
#[must_use]
pub fn error<'a>(state: &'a SiteState, family: &str) -> Option<&'a str> {
    state.status.error(family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> SiteState {
        let mut state = SiteState::new();
        state.cache.upsert(
            kinds::PAGES,
            "7",
            json!({
                "id": 7,
                "slug": "about",
                "title": { "rendered": "About" },
                "content": { "rendered": "<p>Hi</p>" },
                "betterFeaturedImage": { "sourceUrl": "https://cms.test/hero.jpg" },
                "wpsSubtitle": ""
            }),
        );
        state.cache.upsert(kinds::POSTS, "1", json!({ "id": 1 }));
        state.cache.upsert(kinds::POSTS, "2", json!({ "id": 2 }));
        state.cache.record_listing(FETCH_POSTS, vec!["2".into(), "1".into(), "99".into()]);
        state
    }

    #[test]
    fn test_page_fields() {
        let state = state();
        assert_eq!(page_title(&state, 7), Some("About"));
        assert_eq!(page_slug(&state, 7), Some("about"));
        assert_eq!(page_content(&state, 7), Some("<p>Hi</p>"));
        assert_eq!(featured_image_url(&state, 7), Some("https://cms.test/hero.jpg"));
        assert_eq!(page_subtitle(&state, 7), None);
        assert_eq!(page_title(&state, 8), None);
    }

    #[test]
    fn test_needs_page() {
        let state = state();
        assert!(!needs_page(&state, 7));
        assert!(needs_page(&state, 8));
        assert!(!needs_page(&state, 0));
    }

    #[test]
    fn test_listing_skips_uncached_ids() {
        let state = state();
        let ids: Vec<_> = posts(&state).iter().map(|post| post["id"].clone()).collect();
        assert_eq!(ids, vec![json!(2), json!(1)]);
        assert!(media(&state).is_empty());
        assert!(post(&state, 1).is_some());
    }
}
