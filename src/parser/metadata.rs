use roxmltree::Document;
use std::collections::BTreeMap;
use tracing::warn;

use super::descriptor::{element_children, text_content};
use crate::files::FileMetadata;

/// Attribution for one image, matched to staged files by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataEntry {
    pub filename: String,
    pub metadata: FileMetadata,
}

/// Metadata entries per category name
pub type MetadataSet = BTreeMap<String, Vec<MetadataEntry>>;

/// Parse a per-category metadata document.
///
/// Same layout as the descriptor (category element, rows, columns), except
/// that `license` holds a nested element and only its `shortname` is kept.
/// Malformed documents yield an empty set.
pub fn parse_metadata(text: &str) -> MetadataSet {
    let doc = match Document::parse(text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "ignoring malformed metadata document");
            return MetadataSet::new();
        }
    };

    let mut set = MetadataSet::new();
    for category in element_children(doc.root_element()) {
        let entries: &mut Vec<MetadataEntry> = set
            .entry(category.tag_name().name().to_string())
            .or_default();

        for row in element_children(category) {
            let mut entry = MetadataEntry::default();
            for column in element_children(row) {
                match column.tag_name().name() {
                    "filename" => entry.filename = text_content(column),
                    "source" => entry.metadata.source = text_content(column),
                    "author" => entry.metadata.author = text_content(column),
                    "license" => {
                        entry.metadata.license = element_children(column)
                            .find(|n| n.tag_name().name() == "shortname")
                            .map(text_content)
                            .unwrap_or_default()
                    }
                    _ => {}
                }
            }
            entries.push(entry);
        }
    }
    set
}

/// Find the metadata of a file by exact name
pub fn find_metadata<'a>(entries: &'a [MetadataEntry], filename: &str) -> Option<&'a FileMetadata> {
    entries
        .iter()
        .find(|entry| entry.filename == filename)
        .map(|entry| &entry.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<filemetadata>
  <boxes>
    <file>
      <filename>star.svg</filename>
      <source>https://example.org/star</source>
      <author>Doe, Jane</author>
      <license><shortname>cc-4.0</shortname><fullname>Creative Commons 4.0</fullname></license>
    </file>
    <file>
      <filename>moon.svg</filename>
      <author>Roe, Richard</author>
    </file>
  </boxes>
</filemetadata>"#;

    #[test]
    fn test_license_is_flattened() {
        let set = parse_metadata(DOC);
        let entries = &set["boxes"];
        assert_eq!(entries.len(), 2);

        let star = find_metadata(entries, "star.svg").unwrap();
        assert_eq!(star.license, "cc-4.0");
        assert_eq!(star.author, "Doe, Jane");
        assert_eq!(star.source, "https://example.org/star");

        let moon = find_metadata(entries, "moon.svg").unwrap();
        assert_eq!(moon.license, "");
    }

    #[test]
    fn test_no_match() {
        let set = parse_metadata(DOC);
        assert!(find_metadata(&set["boxes"], "sun.svg").is_none());
    }

    #[test]
    fn test_malformed_is_empty() {
        assert!(parse_metadata("<filemetadata><boxes>").is_empty());
    }
}
