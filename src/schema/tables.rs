//! Table schema definitions for the component catalog

use super::types::*;

// =============================================================================
// Entity Tables
// =============================================================================

pub static CATEGORIES: TableSchema = TableSchema {
    name: "elements_compcat",
    alias: "c4l_compcat",
    optional: false,
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("displayname", ColumnType::Text),
        Column::new("displayorder", ColumnType::Integer),
        Column::new("css", ColumnType::Text),
    ],
    indexes: &[Index::unique(&["name"])],
};

pub static COMPONENTS: TableSchema = TableSchema {
    name: "elements_component",
    alias: "c4l_component",
    optional: false,
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("displayname", ColumnType::Text),
        Column::new("compcat", ColumnType::Integer),
        Column::new("categoryname", ColumnType::Text),
        Column::new("code", ColumnType::Text),
        Column::new("text", ColumnType::Text),
        Column::new("css", ColumnType::Text),
        Column::new("js", ColumnType::Text),
        Column::new("iconurl", ColumnType::Text),
        Column::new("flavors", ColumnType::Text),
        Column::new("variants", ColumnType::Text),
        Column::new("displayorder", ColumnType::Integer),
        Column::new("hideforstudents", ColumnType::Integer),
    ],
    indexes: &[Index::unique(&["name"]), Index::on(&["compcat"])],
};

pub static FLAVORS: TableSchema = TableSchema {
    name: "elements_flavor",
    alias: "c4l_flavor",
    optional: false,
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("displayname", ColumnType::Text),
        Column::new("categoryname", ColumnType::Text),
        Column::new("css", ColumnType::Text),
        Column::new("content", ColumnType::Text),
        Column::new("displayorder", ColumnType::Integer),
        Column::new("hideforstudents", ColumnType::Integer),
    ],
    indexes: &[Index::unique(&["name"]), Index::on(&["categoryname"])],
};

pub static VARIANTS: TableSchema = TableSchema {
    name: "elements_variant",
    alias: "c4l_variant",
    optional: false,
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("name", ColumnType::Text),
        Column::new("displayname", ColumnType::Text),
        Column::new("categoryname", ColumnType::Text),
        Column::new("css", ColumnType::Text),
        Column::new("content", ColumnType::Text),
        Column::new("iconurl", ColumnType::Text),
        Column::new("c4lcompatibility", ColumnType::Integer),
    ],
    indexes: &[Index::unique(&["name"]), Index::on(&["categoryname"])],
};

// =============================================================================
// Relation Tables
// =============================================================================

pub static COMPONENT_FLAVORS: TableSchema = TableSchema {
    name: "elements_comp_flavor",
    alias: "c4l_comp_flavor",
    optional: true,
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("componentname", ColumnType::Text),
        Column::required("flavorname", ColumnType::Text),
        Column::new("iconurl", ColumnType::Text),
    ],
    indexes: &[
        Index::unique(&["componentname", "flavorname"]),
        Index::on(&["flavorname"]),
    ],
};

pub static COMPONENT_VARIANTS: TableSchema = TableSchema {
    name: "elements_comp_variant",
    alias: "c4l_comp_variant",
    optional: true,
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("componentname", ColumnType::Text),
        Column::required("variant", ColumnType::Text),
        Column::new("component", ColumnType::Integer),
    ],
    indexes: &[
        Index::unique(&["componentname", "variant"]),
        Index::on(&["variant"]),
    ],
};

/// All tables in import order (parents before children)
pub static ALL_TABLES: &[&TableSchema] = &[
    &CATEGORIES,
    &COMPONENTS,
    &FLAVORS,
    &VARIANTS,
    &COMPONENT_FLAVORS,
    &COMPONENT_VARIANTS,
];

/// Get a table schema by canonical name or legacy alias
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().copied().find(|t| t.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolves_to_canonical() {
        assert_eq!(get_table("c4l_flavor").unwrap().name, "elements_flavor");
        assert_eq!(get_table("elements_flavor").unwrap().name, "elements_flavor");
        assert!(get_table("flavor").is_none());
    }

    #[test]
    fn test_only_relations_are_optional() {
        let optional: Vec<_> = ALL_TABLES
            .iter()
            .filter(|t| t.optional)
            .map(|t| t.name)
            .collect();
        assert_eq!(optional, vec!["elements_comp_flavor", "elements_comp_variant"]);
    }
}
