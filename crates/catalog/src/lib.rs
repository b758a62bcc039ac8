mod record;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;
use walks_core::Place;

pub use record::RecordParser;

/// The process-wide place catalog. Loaded once, then shared as a cheap
/// read-only handle.
#[derive(Debug, Clone)]
pub struct Catalog {
    places: Arc<[Place]>,
    skipped: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogStats {
    pub places_loaded: usize,
    pub records_skipped: usize,
}

impl Catalog {
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            places: places.into(),
            skipped: 0,
        }
    }

    /// Loads a `.jsonl` file, or every `.jsonl` file under a directory in
    /// path order. Malformed records are skipped with a warning.
    pub fn load(path: impl AsRef<Path>, strip_prefixes: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let parser = RecordParser::new(strip_prefixes)?;
        let files = catalog_files(path)?;

        let mut places = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut skipped = 0;

        for file in &files {
            let raw = fs::read_to_string(file)
                .with_context(|| format!("failed reading catalog file {}", file.display()))?;
            skipped += parse_into(&parser, &raw, file, &mut places, &mut seen_ids);
        }

        info!(
            path = %path.display(),
            files = files.len(),
            places = places.len(),
            skipped,
            "catalog loaded"
        );

        Ok(Self {
            places: places.into(),
            skipped,
        })
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn get(&self, id: i64) -> Option<&Place> {
        self.places.iter().find(|place| place.id == id)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            places_loaded: self.places.len(),
            records_skipped: self.skipped,
        }
    }
}

fn catalog_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("catalog path {} does not exist", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed walking {}", path.display()))?;
        let is_jsonl = entry
            .path()
            .extension()
            .and_then(|value| value.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_jsonl {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Appends the valid records of one file and returns how many were skipped.
fn parse_into(
    parser: &RecordParser,
    raw: &str,
    file: &Path,
    places: &mut Vec<Place>,
    seen_ids: &mut HashSet<i64>,
) -> usize {
    let mut skipped = 0;

    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parser.parse_line(index + 1, line) {
            Ok(place) if !seen_ids.insert(place.id) => {
                skipped += 1;
                warn!(
                    file = %file.display(),
                    line = index + 1,
                    id = place.id,
                    "duplicate place id skipped"
                );
            }
            Ok(place) => places.push(place),
            Err(error) => {
                skipped += 1;
                warn!(file = %file.display(), %error, "catalog record skipped");
            }
        }
    }

    skipped
}
