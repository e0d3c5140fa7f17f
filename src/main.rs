use anyhow::{Context, Result};
use elements_import::{
    cli::{Cli, Commands},
    import::{CategoryIdMap, ImportOptions, Importer, Summary},
    schema::ALL_TABLES,
    store::SqliteStore,
    ui::{TracingUi, Ui, UiApp},
    CacheManager, DiskFileStore, FileStore, RecordStore,
};
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // The TUI owns the terminal, so log lines would garble it
    if !matches!(cli.command, Commands::Import { tui: true, .. }) {
        init_tracing();
    }

    match &cli.command {
        Commands::Import {
            bundle,
            dry_run,
            staging_id,
            keep_staging,
            json,
            tui,
        } => {
            let start = Instant::now();
            let options = ImportOptions {
                dry_run: *dry_run,
                cleanup_staging: !*keep_staging,
            };
            let importer = open_importer(&cli, options)?;

            if *tui {
                let mut importer = importer.with_ui(UiApp::new(*dry_run)?);
                let result = importer.import(bundle, *staging_id);
                let summary = importer.results().summary();
                let (_, _, ui) = importer.into_parts();
                match result {
                    Ok(_) => ui.finish(&format!(
                        "{} in {:.1}s",
                        summary,
                        start.elapsed().as_secs_f64()
                    ))?,
                    Err(e) => {
                        ui.restore()?;
                        return Err(e).with_context(|| format!("Failed to import {:?}", bundle));
                    }
                }
            } else {
                let mut importer = importer.with_ui(TracingUi::new());
                let categories = importer
                    .import(bundle, *staging_id)
                    .with_context(|| format!("Failed to import {:?}", bundle))?;
                report(&importer, &categories, *json)?;
                if !*json {
                    println!("Done in {:.1}s", start.elapsed().as_secs_f64());
                }
            }
        }

        Commands::ImportXml {
            descriptor,
            dry_run,
            json,
        } => {
            let text = fs::read_to_string(descriptor)
                .with_context(|| format!("Failed to read {:?}", descriptor))?;
            let options = ImportOptions {
                dry_run: *dry_run,
                ..ImportOptions::default()
            };
            let mut importer = open_importer(&cli, options)?.with_ui(TracingUi::new());
            let categories = importer
                .import_from_descriptor(&text)
                .with_context(|| format!("Failed to import {:?}", descriptor))?;
            report(&importer, &categories, *json)?;
        }

        Commands::ListTables => {
            println!("Descriptor tables:\n");
            for table in ALL_TABLES {
                let optional = if table.optional { " (optional)" } else { "" };
                println!("  {} (legacy: {}){}", table.name, table.alias, optional);
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("elements_import=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_importer(cli: &Cli, options: ImportOptions) -> Result<Importer<SqliteStore, DiskFileStore>> {
    let db_path = cli.db_path()?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    let files_path = cli.files_path()?;
    let files = DiskFileStore::new(&files_path)
        .with_context(|| format!("Failed to open file store {:?}", files_path))?;

    let cache = CacheManager::new(cli.cache_dir.clone())?;
    tracing::debug!(db = ?db_path, files = ?files_path, cache = ?cache.cache_dir(), "opened stores");

    Ok(Importer::new(store, files, options).with_cache(cache.stylesheet_cache()))
}

fn report<S: RecordStore, F: FileStore, U: Ui>(
    importer: &Importer<S, F, U>,
    categories: &CategoryIdMap,
    json: bool,
) -> Result<()> {
    let results = importer.results();
    let summary = results.summary();
    let dry_run = importer.options().dry_run;

    if json {
        let report = serde_json::json!({
            "dry_run": dry_run,
            "categories": categories,
            "results": results,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for event in results.events() {
        println!("{}", event);
    }
    println!();
    for (old_id, new_id) in categories {
        println!("Category {} -> {}", old_id, new_id);
    }
    println!("{}", summary_line(&summary, dry_run));
    Ok(())
}

fn summary_line(summary: &Summary, dry_run: bool) -> String {
    let mode = if dry_run { " (dry run)" } else { "" };
    format!("{}{}", summary, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_marks_dry_run() {
        let summary = Summary {
            created: 2,
            replaced: 1,
            unchanged: 0,
        };
        assert_eq!(summary_line(&summary, false), "2 created, 1 replaced, 0 unchanged");
        assert_eq!(
            summary_line(&summary, true),
            "2 created, 1 replaced, 0 unchanged (dry run)"
        );
    }
}

