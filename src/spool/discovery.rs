//! Spool directory listing and rotation ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::{Result, Unified2Error};

/// Ordering key derived from the part of a file name after the spool prefix.
///
/// Producers rotate with a timestamp or counter suffix, which must be compared
/// as a number (`merged.log.9` comes before `merged.log.10`). Suffixes that
/// are not numbers sort after all numeric ones, lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationKey {
    Numeric(u64),
    Lexical(String),
}

impl RotationKey {
    /// Derive the key for `name`, or `None` when it does not carry `prefix`.
    pub fn for_file(name: &str, prefix: &str) -> Option<Self> {
        let suffix = name.strip_prefix(prefix)?;
        let suffix = suffix.strip_prefix('.').unwrap_or(suffix);
        Some(match suffix.parse::<u64>() {
            Ok(n) => RotationKey::Numeric(n),
            Err(_) => RotationKey::Lexical(suffix.to_string()),
        })
    }
}

impl Ord for RotationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RotationKey::Numeric(a), RotationKey::Numeric(b)) => a.cmp(b),
            (RotationKey::Numeric(_), RotationKey::Lexical(_)) => Ordering::Less,
            (RotationKey::Lexical(_), RotationKey::Numeric(_)) => Ordering::Greater,
            (RotationKey::Lexical(a), RotationKey::Lexical(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for RotationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A file belonging to a spool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolFile {
    pub name: String,
    pub path: PathBuf,
    pub key: RotationKey,
}

/// List the regular files in `dir` whose names start with `prefix`, oldest
/// rotation first.
pub fn discover_spool_files(dir: &Path, prefix: &str) -> Result<Vec<SpoolFile>> {
    let entries =
        fs::read_dir(dir).map_err(|e| Unified2Error::directory_error(dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Unified2Error::directory_error(dir.to_path_buf(), e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(key) = RotationKey::for_file(&name, prefix) else {
            continue;
        };
        // Entries may vanish between listing and stat; skip them.
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        files.push(SpoolFile { path: entry.path(), name, key });
    }

    files.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.name.cmp(&b.name)));
    trace!(dir = %dir.display(), prefix, count = files.len(), "listed spool files");
    Ok(files)
}
