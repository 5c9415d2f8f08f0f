//! Zip archive scanning and extraction for uploaded shapefiles
//!
//! An upload is a zip holding one or more shapefile component sets. Scanning
//! is read-only; only the chosen set is ever written to disk, and only after
//! validation succeeded.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::{IngestError, Result};

/// Component extensions tracked per shapefile set
pub const TRACKED_EXTENSIONS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Extensions a set needs to be readable
pub const REQUIRED_EXTENSIONS: [&str; 2] = ["shp", "shx"];

/// Group of archive members sharing a base name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSet {
    /// Base name as first seen in the archive
    pub base_name: String,
    /// Extension (lower case, no dot) to archive entry index
    #[serde(skip)]
    members: BTreeMap<String, usize>,
}

impl ComponentSet {
    fn new(base_name: &str) -> Self {
        Self { base_name: base_name.to_string(), members: BTreeMap::new() }
    }

    pub fn has(&self, extension: &str) -> bool {
        self.members.contains_key(extension)
    }

    pub fn is_complete(&self) -> bool {
        REQUIRED_EXTENSIONS.iter().all(|ext| self.has(ext))
    }

    /// Found extensions in tracking order, with leading dots
    pub fn found_extensions(&self) -> Vec<String> {
        TRACKED_EXTENSIONS
            .iter()
            .filter(|ext| self.has(ext))
            .map(|ext| format!(".{}", ext))
            .collect()
    }

    /// Missing required extensions, with leading dots
    pub fn missing_extensions(&self) -> Vec<String> {
        REQUIRED_EXTENSIONS
            .iter()
            .filter(|ext| !self.has(ext))
            .map(|ext| format!(".{}", ext))
            .collect()
    }
}

/// A set that cannot be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteSet {
    pub base_name: String,
    pub found_extensions: Vec<String>,
    pub missing_extensions: Vec<String>,
}

impl From<&ComponentSet> for IncompleteSet {
    fn from(set: &ComponentSet) -> Self {
        Self {
            base_name: set.base_name.clone(),
            found_extensions: set.found_extensions(),
            missing_extensions: set.missing_extensions(),
        }
    }
}

/// Result of scanning an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveValidation {
    pub valid: bool,
    /// Base names of sets with both .shp and .shx, sorted case-insensitively
    pub complete_sets: Vec<String>,
    pub incomplete_sets: Vec<IncompleteSet>,
    /// When nothing is complete, the set closest to being readable
    pub best_candidate: Option<IncompleteSet>,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

/// Files written for one extracted set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSet {
    pub base_name: String,
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: Option<PathBuf>,
    pub prj: Option<PathBuf>,
    pub cpg: Option<PathBuf>,
}

/// An opened upload archive
pub struct ShapefileArchive<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    sets: BTreeMap<String, ComponentSet>,
    warnings: Vec<String>,
}

impl<'a> ShapefileArchive<'a> {
    /// Open an archive and group its members; fails if the bytes are not a zip
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| IngestError::Archive {
            reason: format!("not a readable zip file: {}", e),
        })?;

        let mut sets: BTreeMap<String, ComponentSet> = BTreeMap::new();
        let mut warnings = Vec::new();

        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let Some((stem, extension)) = split_member_name(entry.name()) else {
                continue;
            };
            if !TRACKED_EXTENSIONS.contains(&extension.as_str()) {
                continue;
            }

            let set = sets
                .entry(stem.to_lowercase())
                .or_insert_with(|| ComponentSet::new(&stem));
            if set.members.contains_key(&extension) {
                warnings.push(format!(
                    "Ignoring duplicate member '{}' for shapefile '{}'",
                    entry.name(),
                    set.base_name
                ));
                continue;
            }
            set.members.insert(extension, index);
        }

        tracing::debug!(entries = archive.len(), sets = sets.len(), "Scanned archive");

        Ok(Self { archive, sets, warnings })
    }

    /// Component sets in case-insensitive name order
    pub fn sets(&self) -> impl Iterator<Item = &ComponentSet> {
        self.sets.values()
    }

    pub fn find_set(&self, base_name: &str) -> Option<&ComponentSet> {
        self.sets.get(&base_name.to_lowercase())
    }

    /// Report which sets are complete without touching the file system
    pub fn validate(&self) -> ArchiveValidation {
        let complete: Vec<&ComponentSet> = self.sets().filter(|s| s.is_complete()).collect();
        let incomplete_sets: Vec<IncompleteSet> =
            self.sets().filter(|s| !s.is_complete()).map(IncompleteSet::from).collect();

        let mut warnings = self.warnings.clone();
        for set in &complete {
            if !set.has("dbf") {
                warnings.push(format!(
                    "'{}' has no .dbf attribute table; it will be loaded as a geometry-only layer",
                    set.base_name
                ));
            }
            if !set.has("prj") {
                warnings.push(format!(
                    "'{}' has no .prj file; the target CRS will be assumed",
                    set.base_name
                ));
            }
        }

        if !complete.is_empty() {
            return ArchiveValidation {
                valid: true,
                complete_sets: complete.iter().map(|s| s.base_name.clone()).collect(),
                incomplete_sets,
                best_candidate: None,
                warnings,
                error: None,
            };
        }

        // Most tracked members wins; ties keep name order
        let best = self
            .sets()
            .fold(None::<&ComponentSet>, |best, set| match best {
                Some(b) if b.members.len() >= set.members.len() => Some(b),
                _ => Some(set),
            })
            .map(IncompleteSet::from);

        let error = match &best {
            Some(candidate) => format!(
                "No complete shapefile found: '{}' is missing {}",
                candidate.base_name,
                candidate.missing_extensions.join(", ")
            ),
            None => "No shapefile components found in the archive".to_string(),
        };

        ArchiveValidation {
            valid: false,
            complete_sets: vec![],
            incomplete_sets,
            best_candidate: best,
            warnings,
            error: Some(error),
        }
    }

    /// Write the members of one complete set to `dir` as `<base>.<ext>`
    pub fn extract_set(&mut self, base_name: &str, dir: &Path) -> Result<ExtractedSet> {
        let set = self
            .find_set(base_name)
            .cloned()
            .ok_or_else(|| IngestError::Archive {
                reason: format!("shapefile '{}' is not in the archive", base_name),
            })?;
        if !set.is_complete() {
            return Err(IngestError::Archive {
                reason: format!(
                    "shapefile '{}' is missing {}",
                    set.base_name,
                    set.missing_extensions().join(", ")
                ),
            });
        }

        let mut written: BTreeMap<String, PathBuf> = BTreeMap::new();
        for (extension, index) in &set.members {
            let mut entry = self.archive.by_index(*index)?;
            if entry.enclosed_name().is_none() {
                return Err(IngestError::Archive {
                    reason: format!("entry '{}' escapes the archive root", entry.name()),
                });
            }

            let target = dir.join(format!("{}.{}", set.base_name, extension));
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            written.insert(extension.clone(), target);
        }

        tracing::debug!(base = %set.base_name, files = written.len(), dir = %dir.display(), "Extracted shapefile set");

        let mut take = |ext: &str| written.remove(ext);
        let shp = take("shp");
        let shx = take("shx");
        let (Some(shp), Some(shx)) = (shp, shx) else {
            return Err(IngestError::Archive {
                reason: format!("shapefile '{}' could not be extracted", set.base_name),
            });
        };

        Ok(ExtractedSet {
            base_name: set.base_name.clone(),
            shp,
            shx,
            dbf: take("dbf"),
            prj: take("prj"),
            cpg: take("cpg"),
        })
    }
}

/// Validate an uploaded archive
pub fn validate_archive(bytes: &[u8]) -> Result<ArchiveValidation> {
    Ok(ShapefileArchive::open(bytes)?.validate())
}

/// Split an archive member name into (stem, lower-case extension).
///
/// Directory components are stripped; macOS resource-fork entries and names
/// without a stem or extension are skipped.
fn split_member_name(name: &str) -> Option<(String, String)> {
    if name.starts_with("__MACOSX/") || name.contains("/__MACOSX/") {
        return None;
    }
    let file_name = name.rsplit(['/', '\\']).next()?;
    if file_name.starts_with("._") {
        return None;
    }
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some((stem.to_string(), extension.to_ascii_lowercase()))
}
