//! Typed catalog records
//!
//! Each entity knows its table and converts to and from a string-valued
//! [`Row`]. Fields the descriptor may omit are `Option`s; anything not
//! modelled explicitly is kept in `extra` and handed back to the store.

use std::collections::BTreeMap;

use crate::schema::{
    TableSchema, CATEGORIES, COMPONENTS, COMPONENT_FLAVORS, COMPONENT_VARIANTS, FLAVORS, VARIANTS,
};
use crate::store::Row;

pub trait Entity: Sized {
    fn schema() -> &'static TableSchema;

    fn from_row(row: Row) -> Self;

    fn to_row(&self) -> Row;

    /// Natural key as (column, value) pairs
    fn natural_key(&self) -> Vec<(&'static str, &str)>;

    /// Human readable label used in the result log
    fn label(&self) -> String;
}

/// Take a field out of the row, leaving the rest for `extra`
fn take(fields: &mut BTreeMap<String, String>, column: &str) -> Option<String> {
    fields.remove(column)
}

fn take_text(fields: &mut BTreeMap<String, String>, column: &str) -> String {
    take(fields, column).unwrap_or_default()
}

fn take_int(fields: &mut BTreeMap<String, String>, column: &str) -> Option<i64> {
    take(fields, column).and_then(|v| v.trim().parse().ok())
}

fn put(row: &mut Row, column: &str, value: &str) {
    row.set(column, value);
}

fn put_opt<T: ToString>(row: &mut Row, column: &str, value: &Option<T>) {
    if let Some(value) = value {
        row.set(column, value.to_string());
    }
}

fn with_extra(extra: &BTreeMap<String, String>) -> Row {
    Row {
        id: None,
        fields: extra.clone(),
    }
}

/// Split a comma separated name list, dropping empty entries
pub fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').filter(|name| !name.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub displayname: String,
    pub displayorder: Option<i64>,
    pub css: String,
    pub extra: BTreeMap<String, String>,
}

impl Entity for Category {
    fn schema() -> &'static TableSchema {
        &CATEGORIES
    }

    fn from_row(row: Row) -> Self {
        let mut f = row.fields;
        Self {
            id: row.id,
            name: take_text(&mut f, "name"),
            displayname: take_text(&mut f, "displayname"),
            displayorder: take_int(&mut f, "displayorder"),
            css: take_text(&mut f, "css"),
            extra: f,
        }
    }

    fn to_row(&self) -> Row {
        let mut row = with_extra(&self.extra);
        put(&mut row, "name", &self.name);
        put(&mut row, "displayname", &self.displayname);
        put_opt(&mut row, "displayorder", &self.displayorder);
        put(&mut row, "css", &self.css);
        row
    }

    fn natural_key(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    pub id: Option<i64>,
    pub name: String,
    pub displayname: String,
    /// Owning category id (provisional in the descriptor, remapped on import)
    pub compcat: Option<i64>,
    pub categoryname: String,
    pub code: String,
    pub text: String,
    pub css: String,
    pub js: String,
    pub iconurl: String,
    /// Comma separated flavor names
    pub flavors: String,
    /// Comma separated variant names
    pub variants: String,
    pub displayorder: Option<i64>,
    pub hideforstudents: Option<i64>,
    pub extra: BTreeMap<String, String>,
}

impl Entity for Component {
    fn schema() -> &'static TableSchema {
        &COMPONENTS
    }

    fn from_row(row: Row) -> Self {
        let mut f = row.fields;
        Self {
            id: row.id,
            name: take_text(&mut f, "name"),
            displayname: take_text(&mut f, "displayname"),
            compcat: take_int(&mut f, "compcat"),
            categoryname: take_text(&mut f, "categoryname"),
            code: take_text(&mut f, "code"),
            text: take_text(&mut f, "text"),
            css: take_text(&mut f, "css"),
            js: take_text(&mut f, "js"),
            iconurl: take_text(&mut f, "iconurl"),
            flavors: take_text(&mut f, "flavors"),
            variants: take_text(&mut f, "variants"),
            displayorder: take_int(&mut f, "displayorder"),
            hideforstudents: take_int(&mut f, "hideforstudents"),
            extra: f,
        }
    }

    fn to_row(&self) -> Row {
        let mut row = with_extra(&self.extra);
        put(&mut row, "name", &self.name);
        put(&mut row, "displayname", &self.displayname);
        put_opt(&mut row, "compcat", &self.compcat);
        put(&mut row, "categoryname", &self.categoryname);
        put(&mut row, "code", &self.code);
        put(&mut row, "text", &self.text);
        put(&mut row, "css", &self.css);
        put(&mut row, "js", &self.js);
        put(&mut row, "iconurl", &self.iconurl);
        put(&mut row, "flavors", &self.flavors);
        put(&mut row, "variants", &self.variants);
        put_opt(&mut row, "displayorder", &self.displayorder);
        put_opt(&mut row, "hideforstudents", &self.hideforstudents);
        row
    }

    fn natural_key(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flavor {
    pub id: Option<i64>,
    pub name: String,
    pub displayname: String,
    /// Empty in older exports; filled in by the backfill pass
    pub categoryname: Option<String>,
    pub css: String,
    pub content: String,
    pub displayorder: Option<i64>,
    pub hideforstudents: Option<i64>,
    pub extra: BTreeMap<String, String>,
}

impl Entity for Flavor {
    fn schema() -> &'static TableSchema {
        &FLAVORS
    }

    fn from_row(row: Row) -> Self {
        let mut f = row.fields;
        Self {
            id: row.id,
            name: take_text(&mut f, "name"),
            displayname: take_text(&mut f, "displayname"),
            categoryname: take(&mut f, "categoryname").filter(|c| !c.is_empty()),
            css: take_text(&mut f, "css"),
            content: take_text(&mut f, "content"),
            displayorder: take_int(&mut f, "displayorder"),
            hideforstudents: take_int(&mut f, "hideforstudents"),
            extra: f,
        }
    }

    fn to_row(&self) -> Row {
        let mut row = with_extra(&self.extra);
        put(&mut row, "name", &self.name);
        put(&mut row, "displayname", &self.displayname);
        put_opt(&mut row, "categoryname", &self.categoryname);
        put(&mut row, "css", &self.css);
        put(&mut row, "content", &self.content);
        put_opt(&mut row, "displayorder", &self.displayorder);
        put_opt(&mut row, "hideforstudents", &self.hideforstudents);
        row
    }

    fn natural_key(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    pub id: Option<i64>,
    pub name: String,
    pub displayname: String,
    /// Empty in older exports; filled in by the backfill pass
    pub categoryname: Option<String>,
    pub css: String,
    pub content: String,
    pub iconurl: String,
    pub c4lcompatibility: Option<i64>,
    pub extra: BTreeMap<String, String>,
}

impl Entity for Variant {
    fn schema() -> &'static TableSchema {
        &VARIANTS
    }

    fn from_row(row: Row) -> Self {
        let mut f = row.fields;
        Self {
            id: row.id,
            name: take_text(&mut f, "name"),
            displayname: take_text(&mut f, "displayname"),
            categoryname: take(&mut f, "categoryname").filter(|c| !c.is_empty()),
            css: take_text(&mut f, "css"),
            content: take_text(&mut f, "content"),
            iconurl: take_text(&mut f, "iconurl"),
            c4lcompatibility: take_int(&mut f, "c4lcompatibility"),
            extra: f,
        }
    }

    fn to_row(&self) -> Row {
        let mut row = with_extra(&self.extra);
        put(&mut row, "name", &self.name);
        put(&mut row, "displayname", &self.displayname);
        put_opt(&mut row, "categoryname", &self.categoryname);
        put(&mut row, "css", &self.css);
        put(&mut row, "content", &self.content);
        put(&mut row, "iconurl", &self.iconurl);
        put_opt(&mut row, "c4lcompatibility", &self.c4lcompatibility);
        row
    }

    fn natural_key(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFlavor {
    pub id: Option<i64>,
    pub componentname: String,
    pub flavorname: String,
    pub iconurl: String,
    pub extra: BTreeMap<String, String>,
}

impl ComponentFlavor {
    pub fn new(componentname: impl Into<String>, flavorname: impl Into<String>) -> Self {
        Self {
            componentname: componentname.into(),
            flavorname: flavorname.into(),
            ..Self::default()
        }
    }
}

impl Entity for ComponentFlavor {
    fn schema() -> &'static TableSchema {
        &COMPONENT_FLAVORS
    }

    fn from_row(row: Row) -> Self {
        let mut f = row.fields;
        Self {
            id: row.id,
            componentname: take_text(&mut f, "componentname"),
            flavorname: take_text(&mut f, "flavorname"),
            iconurl: take_text(&mut f, "iconurl"),
            extra: f,
        }
    }

    fn to_row(&self) -> Row {
        let mut row = with_extra(&self.extra);
        put(&mut row, "componentname", &self.componentname);
        put(&mut row, "flavorname", &self.flavorname);
        put(&mut row, "iconurl", &self.iconurl);
        row
    }

    fn natural_key(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("componentname", self.componentname.as_str()),
            ("flavorname", self.flavorname.as_str()),
        ]
    }

    fn label(&self) -> String {
        format!("{} - {}", self.componentname, self.flavorname)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentVariant {
    pub id: Option<i64>,
    /// Absent in the legacy shape, which references `component` by id instead
    pub componentname: Option<String>,
    pub variant: String,
    pub component: Option<i64>,
    pub extra: BTreeMap<String, String>,
}

impl ComponentVariant {
    pub fn new(componentname: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            componentname: Some(componentname.into()),
            variant: variant.into(),
            ..Self::default()
        }
    }

    pub fn componentname(&self) -> &str {
        self.componentname.as_deref().unwrap_or_default()
    }
}

impl Entity for ComponentVariant {
    fn schema() -> &'static TableSchema {
        &COMPONENT_VARIANTS
    }

    fn from_row(row: Row) -> Self {
        let mut f = row.fields;
        Self {
            id: row.id,
            componentname: take(&mut f, "componentname"),
            variant: take_text(&mut f, "variant"),
            component: take_int(&mut f, "component"),
            extra: f,
        }
    }

    fn to_row(&self) -> Row {
        let mut row = with_extra(&self.extra);
        put_opt(&mut row, "componentname", &self.componentname);
        put(&mut row, "variant", &self.variant);
        put_opt(&mut row, "component", &self.component);
        row
    }

    fn natural_key(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("componentname", self.componentname()),
            ("variant", self.variant.as_str()),
        ]
    }

    fn label(&self) -> String {
        format!("{} - {}", self.componentname(), self.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_fields(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_category_keeps_extra_fields() {
        let category = Category::from_row(row(&[
            ("id", "3"),
            ("name", "boxes"),
            ("timecreated", "1700000000"),
        ]));
        assert_eq!(category.id, Some(3));
        assert_eq!(category.extra.get("timecreated").unwrap(), "1700000000");
        assert_eq!(category.to_row().text("timecreated"), "1700000000");
    }

    #[test]
    fn test_empty_flavor_category_is_none() {
        let flavor = Flavor::from_row(row(&[("name", "red"), ("categoryname", "")]));
        assert_eq!(flavor.categoryname, None);
        assert_eq!(flavor.to_row().get("categoryname"), None);
    }

    #[test]
    fn test_legacy_component_variant_shape() {
        let relation = ComponentVariant::from_row(row(&[("component", "12"), ("variant", "wide")]));
        assert_eq!(relation.componentname, None);
        assert_eq!(relation.component, Some(12));
        assert_eq!(relation.label(), " - wide");
    }

    #[test]
    fn test_split_names_skips_empty() {
        let names: Vec<_> = split_names("a,,b,").collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
