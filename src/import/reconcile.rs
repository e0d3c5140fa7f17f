//! Per-table reconciliation: upsert by natural key plus the table specific
//! rewriting done before each write.

use tracing::debug;

use super::references::{rewrite_reference, rewrite_references};
use super::{CategoryIdMap, ComponentIdMap, Importer, Outcome, Subject};
use crate::entity::{
    split_names, Category, Component, ComponentFlavor, ComponentVariant, Entity, Flavor, Variant,
};
use crate::error::{ImportError, Result};
use crate::files::FileStore;
use crate::schema::{CATEGORIES, COMPONENT_FLAVORS, COMPONENT_VARIANTS};
use crate::store::{RecordId, RecordStore};
use crate::ui::Ui;

impl<S: RecordStore, F: FileStore, U: Ui> Importer<S, F, U> {
    /// Insert or overwrite a record, keyed by its natural key.
    ///
    /// A matching record keeps its id and gets every column overwritten. In
    /// a dry run nothing is written and new records get a simulated id.
    pub fn upsert<E: Entity>(&mut self, entity: &E, subject: Subject) -> Result<RecordId> {
        self.upsert_with(entity, subject, |e| e)
    }

    fn upsert_with<E: Entity>(
        &mut self,
        entity: &E,
        subject: Subject,
        on_insert_error: impl FnOnce(ImportError) -> ImportError,
    ) -> Result<RecordId> {
        let table = E::schema();
        let row = entity.to_row();
        let existing = self.store.find_one(table, &entity.natural_key())?;

        let (id, outcome) = match existing {
            Some(found) => {
                let id = found.id.ok_or_else(|| {
                    ImportError::Parse(format!("{} row \"{}\" has no id", table.name, entity.label()))
                })?;
                if !self.options.dry_run {
                    self.store.update(table, id, &row)?;
                }
                (RecordId::Persisted(id), Outcome::Replaced)
            }
            None if self.options.dry_run => match self.find_simulated(entity) {
                Some(id) => (id, Outcome::Replaced),
                None => {
                    let id = RecordId::simulated();
                    self.remember_simulated(entity, id);
                    (id, Outcome::Created)
                }
            },
            None => {
                let id = self.store.insert(table, &row).map_err(on_insert_error)?;
                (RecordId::Persisted(id), Outcome::Created)
            }
        };

        self.record(outcome, subject, entity.label());
        Ok(id)
    }

    /// Import a category and return its final id.
    ///
    /// When the id changes, image references in the category's own CSS are
    /// moved to the new id and the record is written a second time.
    pub fn import_category(&mut self, mut category: Category) -> Result<RecordId> {
        let old_id = category.id.take();
        let new_id = self.upsert(&category, Subject::Category)?;

        if let (Some(old_id), RecordId::Persisted(id)) = (old_id, new_id) {
            if old_id != id && !self.options.dry_run {
                let css = rewrite_reference(old_id, id, &category.css);
                if css != category.css {
                    category.css = css;
                    self.store.update(&CATEGORIES, id, &category.to_row())?;
                    debug!(category = %category.name, old_id, new_id = id, "rewrote category css");
                }
            }
        }

        self.batch.add_category(new_id, &category.name);
        Ok(new_id)
    }

    /// Import a component and return its final id.
    ///
    /// An owning category from this import is remapped to its final id and
    /// its name copied into `categoryname`. Embedded references
    /// in `css`, `code`, `js` and `iconurl` are rewritten, and relations
    /// named in `flavors` and `variants` are created if missing.
    pub fn import_component(
        &mut self,
        mut component: Component,
        categories: &CategoryIdMap,
    ) -> Result<RecordId> {
        component.id = None;

        // Categories outside this import keep both compcat and categoryname
        if let Some(&category_id) = component.compcat.and_then(|old| categories.get(&old)) {
            component.compcat = Some(category_id.value());
            if let Some(name) = self.category_name(category_id)? {
                component.categoryname = name;
            }
        }

        component.css = rewrite_references(categories, &component.css);
        component.code = rewrite_references(categories, &component.code);
        component.js = rewrite_references(categories, &component.js);
        component.iconurl = rewrite_references(categories, &component.iconurl);

        let name = component.name.clone();
        let id = self.upsert_with(&component, Subject::Component, |source| {
            ImportError::ComponentInsert {
                name,
                source: Box::new(source),
            }
        })?;

        for flavor in split_names(&component.flavors) {
            self.ensure_relation(ComponentFlavor::new(&component.name, flavor))?;
        }
        for variant in split_names(&component.variants) {
            self.ensure_relation(ComponentVariant::new(&component.name, variant))?;
        }

        Ok(id)
    }

    /// Name of a category by final id: from this batch, else from the store
    fn category_name(&self, id: RecordId) -> Result<Option<String>> {
        if let Some(name) = self.batch.category_name(id) {
            return Ok(Some(name.to_string()));
        }
        let RecordId::Persisted(id) = id else {
            return Ok(None);
        };
        Ok(self
            .store
            .get(&CATEGORIES, id)?
            .map(|row| Category::from_row(row).name))
    }

    /// Insert a relation unless one with the same key exists. Not logged.
    fn ensure_relation<E: Entity>(&mut self, relation: E) -> Result<()> {
        let table = E::schema();
        if self.store.find_one(table, &relation.natural_key())?.is_some() {
            return Ok(());
        }

        if self.options.dry_run {
            if self.find_simulated(&relation).is_none() {
                self.remember_simulated(&relation, RecordId::simulated());
            }
            return Ok(());
        }

        self.store.insert(table, &relation.to_row())?;
        debug!(table = table.name, relation = %relation.label(), "created relation");
        Ok(())
    }

    pub fn import_flavor(&mut self, mut flavor: Flavor, categories: &CategoryIdMap) -> Result<RecordId> {
        flavor.id = None;
        flavor.css = rewrite_references(categories, &flavor.css);
        flavor.content = rewrite_references(categories, &flavor.content);
        self.upsert(&flavor, Subject::Flavor)
    }

    pub fn import_variant(
        &mut self,
        mut variant: Variant,
        categories: &CategoryIdMap,
    ) -> Result<RecordId> {
        variant.id = None;
        variant.css = rewrite_references(categories, &variant.css);
        variant.content = rewrite_references(categories, &variant.content);
        variant.iconurl = rewrite_references(categories, &variant.iconurl);
        self.upsert(&variant, Subject::Variant)
    }

    pub fn import_component_flavor(
        &mut self,
        mut relation: ComponentFlavor,
        categories: &CategoryIdMap,
    ) -> Result<RecordId> {
        relation.id = None;
        relation.iconurl = rewrite_references(categories, &relation.iconurl);
        self.upsert(&relation, Subject::ComponentFlavor)
    }

    /// Import a component-variant relation.
    ///
    /// Exports of the predecessor plugin identify the component by its
    /// provisional id only. Such a relation is resolved through the
    /// component id map; if the component was not part of this import the
    /// relation is dropped and `None` is returned.
    pub fn import_component_variant(
        &mut self,
        mut relation: ComponentVariant,
        components: &ComponentIdMap,
    ) -> Result<Option<RecordId>> {
        relation.id = None;

        if relation.componentname.is_none() {
            let resolved = relation.component.and_then(|old_id| {
                let new_id = components.get(&old_id)?;
                let name = self.batch.component_names.get(&old_id)?;
                Some((*new_id, name.clone()))
            });
            let Some((component_id, name)) = resolved else {
                debug!(
                    component = ?relation.component,
                    variant = %relation.variant,
                    "skipping relation to a component outside this import"
                );
                return Ok(None);
            };
            relation.component = Some(component_id.value());
            relation.componentname = Some(name);
        }

        self.upsert(&relation, Subject::ComponentVariant).map(Some)
    }
}
