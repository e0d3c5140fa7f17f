//! Category names for flavors and variants.
//!
//! Older exports carry no category on flavors and variants. After all
//! tables are imported, each one without a category inherits it from the
//! first component it is related to.

use tracing::debug;

use super::Importer;
use crate::entity::{Category, Component, Entity};
use crate::error::Result;
use crate::files::FileStore;
use crate::schema::{
    TableSchema, CATEGORIES, COMPONENTS, COMPONENT_FLAVORS, COMPONENT_VARIANTS, FLAVORS, VARIANTS,
};
use crate::store::RecordStore;
use crate::ui::Ui;

impl<S: RecordStore, F: FileStore, U: Ui> Importer<S, F, U> {
    /// Fill in missing flavor and variant category names.
    ///
    /// Works directly on the store and runs on dry runs too. Returns the
    /// number of records updated.
    pub fn update_flavor_variant_category(&mut self) -> Result<usize> {
        let flavors = self.backfill(&FLAVORS, &COMPONENT_FLAVORS, "flavorname")?;
        let variants = self.backfill(&VARIANTS, &COMPONENT_VARIANTS, "variant")?;
        if flavors + variants > 0 {
            debug!(flavors, variants, "backfilled category names");
        }
        Ok(flavors + variants)
    }

    fn backfill(
        &mut self,
        table: &TableSchema,
        relations: &TableSchema,
        relation_column: &str,
    ) -> Result<usize> {
        let mut updated = 0;
        for row in self.store.find_many(table, &[("categoryname", "")])? {
            let Some(id) = row.id else { continue };
            let name = row.text("name");

            let Some(category) = self.inherited_category(relations, relation_column, &name)? else {
                continue;
            };
            self.store.set_field(table, id, "categoryname", &category)?;
            debug!(table = table.name, record = %name, category = %category, "set category name");
            updated += 1;
        }
        Ok(updated)
    }

    /// Category name of the first existing component related to `name`
    fn inherited_category(
        &self,
        relations: &TableSchema,
        relation_column: &str,
        name: &str,
    ) -> Result<Option<String>> {
        for relation in self.store.find_many(relations, &[(relation_column, name)])? {
            let componentname = relation.text("componentname");
            let Some(row) = self.store.find_one(&COMPONENTS, &[("name", componentname.as_str())])? else {
                continue;
            };
            let component = Component::from_row(row);

            let from_category = match component.compcat {
                Some(id) => self
                    .store
                    .get(&CATEGORIES, id)?
                    .map(|row| Category::from_row(row).name),
                None => None,
            };
            let category = from_category
                .filter(|name| !name.is_empty())
                .unwrap_or(component.categoryname);

            return Ok(Some(category).filter(|name| !name.is_empty()));
        }
        Ok(None)
    }
}
