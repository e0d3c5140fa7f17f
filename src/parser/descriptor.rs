use roxmltree::{Document, Node};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::schema::{get_table, TableSchema, ALL_TABLES, CATEGORIES};
use crate::store::Row;

/// Parsed export descriptor: rows per canonical table name
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    tables: HashMap<&'static str, Vec<Row>>,
}

impl Descriptor {
    /// Rows of a table, in document order. Absent optional tables are empty.
    pub fn rows(&self, table: &TableSchema) -> &[Row] {
        self.tables.get(table.name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

/// Parse descriptor XML.
///
/// Shape: the root element holds one element per table (canonical or legacy
/// name), each holding one element per row, each holding one element per
/// column. All values are strings.
pub fn parse_descriptor(text: &str) -> Result<Descriptor> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    for table in ALL_TABLES {
        let present = element_children(root).any(|node| table.matches(node.tag_name().name()));
        if !present && !table.optional {
            return Err(ImportError::MissingTable(table.name.to_string()));
        }
    }

    let mut descriptor = Descriptor::default();
    for table_node in element_children(root) {
        let tag = table_node.tag_name().name();
        let Some(table) = get_table(tag) else {
            warn!(table = tag, "ignoring unknown table in descriptor");
            continue;
        };

        let rows = descriptor.tables.entry(table.name).or_default();
        for row_node in element_children(table_node) {
            rows.push(Row::from_fields(read_columns(row_node)));
        }
    }

    for category in descriptor.rows(&CATEGORIES) {
        if category.id.is_none() {
            return Err(ImportError::Parse(format!(
                "category \"{}\" has no numeric id",
                category.text("name")
            )));
        }
    }

    debug!(rows = descriptor.row_count(), "descriptor parsed");
    Ok(descriptor)
}

pub(crate) fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

/// Concatenated text (including CDATA) directly inside an element
pub(crate) fn text_content(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn read_columns(row_node: Node<'_, '_>) -> BTreeMap<String, String> {
    element_children(row_node)
        .map(|column| (column.tag_name().name().to_string(), text_content(column)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{COMPONENTS, COMPONENT_FLAVORS, FLAVORS, VARIANTS};

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<elements>
  <elements_compcat>
    <record><id>1</id><name>boxes</name><css><![CDATA[.a > .b { color: red; }]]></css></record>
  </elements_compcat>
  <elements_component>
    <record><id>4</id><name>tip</name><compcat>1</compcat></record>
  </elements_component>
  <c4l_flavor>
    <record><id>2</id><name>red</name></record>
  </c4l_flavor>
  <elements_variant/>
</elements>"#;

    #[test]
    fn test_parse_rows_and_aliases() {
        let descriptor = parse_descriptor(MINIMAL).unwrap();

        let categories = descriptor.rows(&CATEGORIES);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, Some(1));
        assert_eq!(categories[0].text("css"), ".a > .b { color: red; }");

        assert_eq!(descriptor.rows(&COMPONENTS)[0].text("compcat"), "1");
        assert_eq!(descriptor.rows(&FLAVORS)[0].text("name"), "red");
        assert!(descriptor.rows(&VARIANTS).is_empty());
        assert!(descriptor.rows(&COMPONENT_FLAVORS).is_empty());
        assert_eq!(descriptor.row_count(), 3);
    }

    #[test]
    fn test_missing_mandatory_table() {
        let text = "<elements><elements_compcat/><elements_component/><elements_flavor/></elements>";
        match parse_descriptor(text) {
            Err(ImportError::MissingTable(name)) => assert_eq!(name, "elements_variant"),
            other => panic!("expected MissingTable, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_descriptor("<elements><elements_compcat>"),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn test_category_without_id_is_rejected() {
        let text = "<elements><elements_compcat><r><name>x</name></r></elements_compcat>\
                    <elements_component/><elements_flavor/><elements_variant/></elements>";
        assert!(matches!(parse_descriptor(text), Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_canonical_and_alias_are_merged() {
        let text = "<elements><elements_compcat/><elements_component/><elements_variant/>\
                    <elements_flavor><r><name>a</name></r></elements_flavor>\
                    <c4l_flavor><r><name>b</name></r></c4l_flavor></elements>";
        let descriptor = parse_descriptor(text).unwrap();
        let names: Vec<String> = descriptor.rows(&FLAVORS).iter().map(|r| r.text("name")).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
