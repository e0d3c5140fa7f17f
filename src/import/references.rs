//! Rewriting of embedded image references
//!
//! Stored text (CSS, HTML, JS, icon URLs) points at category images through
//! URLs containing `/elements/images/<categoryid>/`. When a category ends up
//! with a different id than the one in the export, every such reference has
//! to follow it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

use super::CategoryIdMap;

/// Path segment that precedes the owning category id in image URLs
pub const IMAGE_AREA: &str = "/elements/images/";

static IMAGE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/elements/images/(\d+)/").expect("valid image reference pattern"));

/// Build the URL path prefix for images of a category
pub fn image_prefix(category_id: i64) -> String {
    format!("{}{}/", IMAGE_AREA, category_id)
}

/// Replace references to `old_id` with references to `new_id`
pub fn rewrite_reference(old_id: i64, new_id: i64, text: &str) -> String {
    if old_id == new_id {
        return text.to_string();
    }
    text.replace(&image_prefix(old_id), &image_prefix(new_id))
}

/// Rewrite every reference whose category id appears in the map.
///
/// The text is scanned once, so a map containing both 5→42 and 42→7 moves
/// old 5 to 42 and old 42 to 7 without chaining.
pub fn rewrite_references(map: &CategoryIdMap, text: &str) -> String {
    if map.is_empty() || !text.contains(IMAGE_AREA) {
        return text.to_string();
    }

    let rewritten: Cow<'_, str> = IMAGE_REFERENCE.replace_all(text, |caps: &Captures<'_>| {
        match caps[1].parse::<i64>().ok().and_then(|old| map.get(&old)) {
            Some(new_id) => image_prefix(new_id.value()),
            None => caps[0].to_string(),
        }
    });
    rewritten.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordId;

    #[test]
    fn test_single_rewrite() {
        let css = ".box { background: url(@@PLUGINFILE@@/elements/images/5/bg.png); }";
        assert_eq!(
            rewrite_reference(5, 42, css),
            ".box { background: url(@@PLUGINFILE@@/elements/images/42/bg.png); }"
        );
    }

    #[test]
    fn test_single_rewrite_does_not_touch_prefix_matches() {
        let css = "url(/elements/images/55/a.png)";
        assert_eq!(rewrite_reference(5, 42, css), css);
    }

    #[test]
    fn test_bulk_rewrite_does_not_chain() {
        let map = CategoryIdMap::from([
            (5, RecordId::Persisted(42)),
            (42, RecordId::Persisted(7)),
        ]);
        let html = r#"<img src="/elements/images/5/a.svg"><img src="/elements/images/42/b.svg">"#;
        assert_eq!(
            rewrite_references(&map, html),
            r#"<img src="/elements/images/42/a.svg"><img src="/elements/images/7/b.svg">"#
        );
    }

    #[test]
    fn test_bulk_rewrite_leaves_unknown_ids() {
        let map = CategoryIdMap::from([(1, RecordId::Persisted(2))]);
        let text = "/elements/images/9/x.png";
        assert_eq!(rewrite_references(&map, text), text);
    }

    #[test]
    fn test_bulk_rewrite_with_simulated_ids() {
        let map = CategoryIdMap::from([(3, RecordId::Simulated(11))]);
        assert_eq!(
            rewrite_references(&map, "/elements/images/3/x.png"),
            "/elements/images/11/x.png"
        );
    }
}
