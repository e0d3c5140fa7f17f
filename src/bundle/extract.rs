use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::Result;

/// Extract a zip file into the destination directory, keeping its layout.
///
/// Entries whose names would escape `dest_dir` are skipped. Returns the
/// number of files written.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<usize> {
    let file = File::open(zip_path)?;
    let reader = BufReader::new(file);
    let mut archive = ZipArchive::new(reader)?;

    fs::create_dir_all(dest_dir)?;

    let total_entries = archive.len();
    let mut written = 0;

    for i in 0..total_entries {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!(name = entry.name(), "skipping archive entry outside the bundle");
            continue;
        };
        let dest_path = dest_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut dest_file = File::create(&dest_path)?;
        io::copy(&mut entry, &mut dest_file)?;
        written += 1;
    }

    debug!(entries = total_entries, files = written, dest = ?dest_dir, "extraction complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_extract_keeps_directories() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bundle.zip");

        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        writer
            .start_file("elements_export.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<elements/>").unwrap();
        writer.add_directory("boxes/", SimpleFileOptions::default()).unwrap();
        writer
            .start_file("boxes/icons/star.svg", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<svg/>").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        let count = extract_zip(&zip_path, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(dest.join("boxes/icons/star.svg")).unwrap(), b"<svg/>");
        assert!(dest.join("elements_export.xml").exists());
    }
}
