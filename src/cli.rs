use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "elements-import")]
#[command(version, about = "Import element catalog export bundles")]
pub struct Cli {
    /// SQLite database holding the catalog
    #[arg(long, global = true, env = "ELEMENTS_DB")]
    pub db: Option<PathBuf>,

    /// Directory holding category images and staged bundles
    #[arg(long, global = true, env = "ELEMENTS_FILES_DIR")]
    pub files_dir: Option<PathBuf>,

    /// Directory for the rebuilt stylesheet cache
    #[arg(long, global = true, env = "ELEMENTS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import an export bundle (zip with descriptor and images)
    Import {
        /// Bundle zip file
        bundle: PathBuf,

        /// Report what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Staging area id to unpack the bundle into
        #[arg(long, default_value_t = 0)]
        staging_id: i64,

        /// Leave the unpacked bundle in the staging area
        #[arg(long)]
        keep_staging: bool,

        /// Print the result report as JSON
        #[arg(long, conflicts_with = "tui")]
        json: bool,

        /// Show progress in a full-screen terminal UI
        #[arg(long)]
        tui: bool,
    },

    /// Import a bare descriptor document (no images)
    ImportXml {
        /// Descriptor XML file
        descriptor: PathBuf,

        /// Report what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print the result report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tables a descriptor may contain
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("elements.sqlite")),
        }
    }

    pub fn files_path(&self) -> Result<PathBuf> {
        match &self.files_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("files")),
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "elements-import")
        .context("Could not determine data directory")?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_arguments() {
        let cli = Cli::try_parse_from([
            "elements-import",
            "--db",
            "/tmp/catalog.sqlite",
            "import",
            "bundle.zip",
            "--dry-run",
            "--staging-id",
            "7",
        ])
        .unwrap();

        assert_eq!(cli.db_path().unwrap(), PathBuf::from("/tmp/catalog.sqlite"));
        match cli.command {
            Commands::Import {
                bundle,
                dry_run,
                staging_id,
                keep_staging,
                ..
            } => {
                assert_eq!(bundle, PathBuf::from("bundle.zip"));
                assert!(dry_run);
                assert_eq!(staging_id, 7);
                assert!(!keep_staging);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_json_and_tui_conflict() {
        let result = Cli::try_parse_from(["elements-import", "import", "b.zip", "--json", "--tui"]);
        assert!(result.is_err());
    }
}
