//! Import engine
//!
//! An [`Importer`] reconciles an export bundle against the record store and
//! the image store. Tables are processed in a fixed order (categories,
//! components, flavors, variants, then the two relation tables), followed by
//! the category name backfill and finally the category images.
//!
//! Ids in the descriptor are provisional. Every category and component gets
//! a final id on import, and references embedded in text fields are
//! rewritten from the provisional category ids to the final ones.

pub mod assets;
pub mod backfill;
pub mod reconcile;
pub mod references;
pub mod results;

pub use assets::strip_category;
pub use references::{image_prefix, rewrite_reference, rewrite_references};
pub use results::{ImportEvent, Outcome, ResultLog, Subject, Summary};

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::bundle::{load_descriptor, load_metadata};
use crate::cache::CacheRebuilder;
use crate::entity::{Category, Component, ComponentFlavor, ComponentVariant, Entity, Flavor, Variant};
use crate::error::Result;
use crate::files::{FileScope, FileStore};
use crate::parser::parse_descriptor;
use crate::schema::{TableSchema, CATEGORIES, COMPONENTS, COMPONENT_FLAVORS, COMPONENT_VARIANTS, FLAVORS, VARIANTS};
use crate::store::{RecordId, RecordStore};
use crate::ui::{Phase, SilentUi, Ui};

/// Provisional category id from the descriptor to final id
pub type CategoryIdMap = BTreeMap<i64, RecordId>;

/// Provisional component id from the descriptor to final id
pub type ComponentIdMap = BTreeMap<i64, RecordId>;

/// Engine switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Make every decision but write nothing (except the backfill)
    pub dry_run: bool,
    /// Delete the staging scope once the import has finished
    pub cleanup_staging: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            cleanup_staging: true,
        }
    }
}

impl ImportOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// State of the descriptor currently being imported
#[derive(Debug, Default)]
struct Batch {
    /// Imported categories in descriptor order: final id and name
    categories: Vec<(RecordId, String)>,
    /// Component names by provisional id
    component_names: BTreeMap<i64, String>,
    /// Records a dry run pretended to insert, by table and natural key
    simulated: HashMap<(&'static str, String), RecordId>,
}

impl Batch {
    fn category_name(&self, id: RecordId) -> Option<&str> {
        self.categories
            .iter()
            .find(|(category_id, _)| *category_id == id)
            .map(|(_, name)| name.as_str())
    }

    fn add_category(&mut self, id: RecordId, name: &str) {
        if self.category_name(id).is_none() {
            self.categories.push((id, name.to_string()));
        }
    }
}

/// Join a natural key into a single lookup string
fn key_string(key: &[(&str, &str)]) -> String {
    key.iter()
        .map(|(_, value)| *value)
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

pub struct Importer<S, F, U = SilentUi> {
    store: S,
    files: F,
    ui: U,
    cache: Option<Box<dyn CacheRebuilder>>,
    options: ImportOptions,
    results: ResultLog,
    batch: Batch,
}

impl<S: RecordStore, F: FileStore> Importer<S, F, SilentUi> {
    pub fn new(store: S, files: F, options: ImportOptions) -> Self {
        Self {
            store,
            files,
            ui: SilentUi::new(),
            cache: None,
            options,
            results: ResultLog::new(),
            batch: Batch::default(),
        }
    }
}

impl<S: RecordStore, F: FileStore, U: Ui> Importer<S, F, U> {
    /// Render progress and results through another UI
    pub fn with_ui<V: Ui>(self, ui: V) -> Importer<S, F, V> {
        Importer {
            store: self.store,
            files: self.files,
            ui,
            cache: self.cache,
            options: self.options,
            results: self.results,
            batch: self.batch,
        }
    }

    /// Cache to rebuild after a successful (non dry run) import
    pub fn with_cache(mut self, cache: impl CacheRebuilder + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    /// Outcomes of the last import, in processing order
    pub fn results(&self) -> &ResultLog {
        &self.results
    }

    pub fn into_parts(self) -> (S, F, U) {
        (self.store, self.files, self.ui)
    }

    /// Import an export bundle.
    ///
    /// The archive is unpacked into the staging scope `staging_item`, the
    /// descriptor is reconciled and then each imported category's images
    /// are imported. Returns the category id map.
    pub fn import(&mut self, archive: &Path, staging_item: i64) -> Result<CategoryIdMap> {
        let staging = FileScope::staging(staging_item);
        let result = self.import_staged(archive, &staging);

        if self.options.cleanup_staging {
            if let Err(e) = self.files.delete_scope(&staging) {
                warn!(scope = %staging, error = %e, "failed to clean up staging files");
                if result.is_ok() {
                    return Err(e);
                }
            }
        }

        result
    }

    fn import_staged(&mut self, archive: &Path, staging: &FileScope) -> Result<CategoryIdMap> {
        self.ui.set_phase(Phase::Extracting);
        self.ui.set_info(archive.display().to_string());
        let descriptor = load_descriptor(&mut self.files, archive, staging)?;

        let category_map = self.import_from_descriptor(&descriptor)?;

        self.ui.set_phase(Phase::ImportingFiles);
        let categories = self.batch.categories.clone();
        for (index, (category_id, name)) in categories.iter().enumerate() {
            self.ui
                .set_progress(index as u64, categories.len() as u64, name.as_str());

            let staged = self
                .files
                .list_files(staging, &format!("/{}/", name), true)?;
            let metadata = load_metadata(&self.files, staging, name);
            let entries = metadata.get(name).map(Vec::as_slice).unwrap_or(&[]);

            self.import_assets(&staged, *category_id, entries, name)?;
        }
        self.ui.clear_progress();

        info!(summary = %self.results.summary(), "bundle import finished");
        Ok(category_map)
    }

    /// Reconcile a descriptor document against the record store.
    ///
    /// Resets the result log. Returns the category id map.
    pub fn import_from_descriptor(&mut self, text: &str) -> Result<CategoryIdMap> {
        self.results = ResultLog::new();
        self.batch = Batch::default();

        self.ui.set_phase(Phase::Parsing);
        let descriptor = parse_descriptor(text)?;

        self.ui.set_phase(Phase::Reconciling);
        let dry_run = self.options.dry_run;
        info!(rows = descriptor.row_count(), dry_run, "importing descriptor");

        let mut category_map = CategoryIdMap::new();
        let rows = descriptor.rows(&CATEGORIES);
        for (index, row) in rows.iter().enumerate() {
            self.progress(&CATEGORIES, index, rows.len());
            let category = Category::from_row(row.clone());
            let old_id = category.id;
            let new_id = self.import_category(category)?;
            if let Some(old_id) = old_id {
                category_map.insert(old_id, new_id);
            }
        }
        self.table_done(&CATEGORIES, rows.len());

        let mut component_map = ComponentIdMap::new();
        let rows = descriptor.rows(&COMPONENTS);
        for (index, row) in rows.iter().enumerate() {
            self.progress(&COMPONENTS, index, rows.len());
            let component = Component::from_row(row.clone());
            let old_id = component.id;
            let name = component.name.clone();
            let new_id = self.import_component(component, &category_map)?;
            if let Some(old_id) = old_id {
                component_map.insert(old_id, new_id);
                self.batch.component_names.insert(old_id, name);
            }
        }
        self.table_done(&COMPONENTS, rows.len());

        let rows = descriptor.rows(&FLAVORS);
        for (index, row) in rows.iter().enumerate() {
            self.progress(&FLAVORS, index, rows.len());
            self.import_flavor(Flavor::from_row(row.clone()), &category_map)?;
        }
        self.table_done(&FLAVORS, rows.len());

        let rows = descriptor.rows(&VARIANTS);
        for (index, row) in rows.iter().enumerate() {
            self.progress(&VARIANTS, index, rows.len());
            self.import_variant(Variant::from_row(row.clone()), &category_map)?;
        }
        self.table_done(&VARIANTS, rows.len());

        let rows = descriptor.rows(&COMPONENT_FLAVORS);
        for (index, row) in rows.iter().enumerate() {
            self.progress(&COMPONENT_FLAVORS, index, rows.len());
            self.import_component_flavor(ComponentFlavor::from_row(row.clone()), &category_map)?;
        }
        self.table_done(&COMPONENT_FLAVORS, rows.len());

        let rows = descriptor.rows(&COMPONENT_VARIANTS);
        for (index, row) in rows.iter().enumerate() {
            self.progress(&COMPONENT_VARIANTS, index, rows.len());
            self.import_component_variant(ComponentVariant::from_row(row.clone()), &component_map)?;
        }
        self.table_done(&COMPONENT_VARIANTS, rows.len());

        self.update_flavor_variant_category()?;

        if !dry_run {
            if let Some(cache) = self.cache.as_mut() {
                cache.invalidate_and_rebuild(&self.store)?;
            }
        }
        self.ui.clear_progress();

        info!(
            categories = category_map.len(),
            components = component_map.len(),
            summary = %self.results.summary(),
            "descriptor imported"
        );
        Ok(category_map)
    }

    fn progress(&mut self, table: &TableSchema, index: usize, total: usize) {
        self.ui.set_progress(index as u64, total as u64, table.name);
    }

    fn table_done(&mut self, table: &TableSchema, total: usize) {
        self.ui.set_progress(total as u64, total as u64, table.name);
        info!(table = table.name, rows = total, "table imported");
    }

    /// Append an outcome to the result log and show it
    fn record(&mut self, outcome: Outcome, subject: Subject, label: String) {
        let event = ImportEvent::new(outcome, subject, label);
        debug!(code = %event.code(), label = %event.label, "import decision");
        self.ui.record(&event);
        self.results.push(event);
    }

    fn remember_simulated<E: Entity>(&mut self, entity: &E, id: RecordId) {
        let key = key_string(&entity.natural_key());
        self.batch.simulated.insert((E::schema().name, key), id);
    }

    fn find_simulated<E: Entity>(&self, entity: &E) -> Option<RecordId> {
        let key = key_string(&entity.natural_key());
        self.batch.simulated.get(&(E::schema().name, key)).copied()
    }
}
