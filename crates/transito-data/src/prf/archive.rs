//! Extraction of the `datatran` CSV from a PRF ZIP archive.

use crate::error::{DataError, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Returns the bytes of the first `.csv` entry in the archive.
///
/// Corrupt entries are skipped with a warning; an archive without any
/// readable CSV entry is an error.
pub fn extract_datatran_csv(archive_path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping corrupt zip entry {i} in {}: {e}", archive_path.display());
                continue;
            }
        };

        if !entry.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }

        debug!(
            entry = entry.name(),
            size = entry.size(),
            "extracting datatran csv"
        );
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        return Ok(bytes);
    }

    Err(DataError::MissingCsv(archive_path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            zip_writer.start_file(*name, options).unwrap();
            zip_writer.write_all(data).unwrap();
        }
        zip_writer.finish().unwrap();
    }

    #[test]
    fn extracts_first_csv_entry() {
        let tmp = std::env::temp_dir().join("transito_archive_extract");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("datatran2020.zip");
        write_zip(
            &zip_path,
            &[
                ("LEIAME.txt", b"ignore me"),
                ("datatran2020.CSV", b"data_inversa;uf;mortos;feridos\n"),
            ],
        );

        let bytes = extract_datatran_csv(&zip_path).unwrap();
        assert_eq!(bytes, b"data_inversa;uf;mortos;feridos\n");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn archive_without_csv_is_an_error() {
        let tmp = std::env::temp_dir().join("transito_archive_no_csv");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("empty.zip");
        write_zip(&zip_path, &[("notes.txt", b"nothing here")]);

        let result = extract_datatran_csv(&zip_path);
        assert!(matches!(result, Err(DataError::MissingCsv(_))));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
