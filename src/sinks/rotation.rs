//! Size-based rotation with retention
//!
//! The [`RotationManager`] decides when the active file must roll over,
//! renames it to a name derived from the configured pattern, and prunes
//! rotated files beyond the retention count. It never touches the open
//! file handle; the file sink flushes and closes it before calling
//! [`RotationManager::rotate`].

use crate::core::config::{LoggerConfig, BASE_SLOT, TIMESTAMP_SLOT};
use crate::core::error::{LoggerError, Result};
use crate::core::timestamp::file_stamp;
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Collision-suffix attempts (`_1`, `_2`, ...) before falling back to a random suffix
pub const MAX_NAME_ATTEMPTS: usize = 100;

/// Length of a rendered `{timestamp}` slot, e.g. `20250108_103045`
const STAMP_LEN: usize = 15;

/// Outcome of pruning rotated files
#[derive(Debug, Default)]
pub struct PruneReport {
    pub deleted: Vec<PathBuf>,
    /// One entry per file that could not be removed; pruning continues past them
    pub failures: Vec<LoggerError>,
}

#[derive(Debug, Clone)]
pub struct RotationManager {
    active_path: PathBuf,
    directory: PathBuf,
    base_name: String,
    pattern: String,
    max_file_size: u64,
    max_retained_files: usize,
    enabled: bool,
}

impl RotationManager {
    /// Create a manager for `active_path`
    ///
    /// `{base}` in `pattern` is the active file's stem.
    pub fn new(
        active_path: impl Into<PathBuf>,
        pattern: impl Into<String>,
        max_file_size: u64,
        max_retained_files: usize,
    ) -> Self {
        let active_path = active_path.into();
        let directory = match active_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base_name = active_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());

        Self {
            active_path,
            directory,
            base_name,
            pattern: pattern.into(),
            max_file_size,
            max_retained_files,
            enabled: true,
        }
    }

    pub fn from_config(config: &LoggerConfig, active_path: impl Into<PathBuf>) -> Self {
        Self::new(
            active_path,
            config.file_name_pattern.clone(),
            config.max_file_size,
            config.max_retained_files,
        )
        .with_enabled(config.rotation_enabled)
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_retained_files(&self) -> usize {
        self.max_retained_files
    }

    /// Whether appending `incoming` bytes to a file of `current` bytes
    /// would push it past the threshold
    ///
    /// An empty file never rotates, so an oversized single write still lands.
    pub fn would_exceed(&self, current: u64, incoming: u64) -> bool {
        self.enabled && current > 0 && current.saturating_add(incoming) > self.max_file_size
    }

    /// Whether a file found at startup is already at or past the threshold
    pub fn needs_rotation_at_startup(&self, existing: u64) -> bool {
        self.enabled && existing > 0 && existing >= self.max_file_size
    }

    /// Pick a rotated file name that does not exist yet
    pub fn candidate_path(&self, now: &DateTime<Local>) -> PathBuf {
        self.candidate_path_with_attempts(now, MAX_NAME_ATTEMPTS)
    }

    fn candidate_path_with_attempts(&self, now: &DateTime<Local>, attempts: usize) -> PathBuf {
        let name = self
            .pattern
            .replace(BASE_SLOT, &self.base_name)
            .replace(TIMESTAMP_SLOT, &file_stamp(now));

        let first = self.directory.join(&name);
        if !first.exists() {
            return first;
        }

        let (stem, ext) = split_extension(&name);
        for n in 1..attempts {
            let candidate = self.directory.join(format!("{}_{}{}", stem, n, ext));
            if !candidate.exists() {
                return candidate;
            }
        }

        loop {
            let candidate = self
                .directory
                .join(format!("{}_{:016x}{}", stem, rand::random::<u64>(), ext));
            if !candidate.exists() {
                return candidate;
            }
        }
    }

    /// Rename the active file to a fresh rotated name
    ///
    /// The caller must have flushed and closed its handle on the active file.
    pub fn rotate(&self, now: &DateTime<Local>) -> Result<PathBuf> {
        let target = self.candidate_path(now);
        fs::rename(&self.active_path, &target).map_err(|e| {
            LoggerError::file_rotation(
                self.active_path.display().to_string(),
                format!("Failed to rename to '{}': {}", target.display(), e),
            )
        })?;
        Ok(target)
    }

    /// Rotated files belonging to this manager, newest first
    pub fn rotated_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&self.directory)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !self.is_rotated_name(name) {
                continue;
            }
            let metadata = dir_entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((created, dir_entry.path()));
        }

        files.sort_by(|(a_time, a_path), (b_time, b_path)| {
            b_time
                .cmp(a_time)
                .then_with(|| name_order_key(b_path).cmp(&name_order_key(a_path)))
        });
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete every rotated file beyond the retention count
    pub fn prune(&self) -> PruneReport {
        let mut report = PruneReport::default();

        let files = match self.rotated_files() {
            Ok(files) => files,
            Err(e) => {
                report.failures.push(LoggerError::cleanup(
                    self.directory.display().to_string(),
                    format!("Failed to list rotated files: {}", e),
                ));
                return report;
            }
        };

        for path in files.into_iter().skip(self.max_retained_files) {
            match fs::remove_file(&path) {
                Ok(()) => report.deleted.push(path),
                Err(e) => report
                    .failures
                    .push(LoggerError::cleanup(path.display().to_string(), e.to_string())),
            }
        }

        report
    }

    /// Whether `name` is a file this manager produced by rotation
    fn is_rotated_name(&self, name: &str) -> bool {
        let active_name = self.active_path.file_name().and_then(|n| n.to_str());
        if Some(name) == active_name {
            return false;
        }

        let Some((prefix, suffix)) = self.pattern.split_once(TIMESTAMP_SLOT) else {
            return false;
        };
        let prefix = prefix.replace(BASE_SLOT, &self.base_name);
        let suffix = suffix.replace(BASE_SLOT, &self.base_name);

        // A collision suffix lands before the extension, which may sit
        // inside or after the `{timestamp}` slot depending on the pattern
        [Cow::Borrowed(name), strip_collision_suffix(name)]
            .iter()
            .any(|candidate| {
                candidate
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(suffix.as_str()))
                    .is_some_and(is_stamp_with_counter)
            })
    }
}

/// Split `name` into stem and extension (including the dot)
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Drop a trailing `_<hex>` from the stem, keeping the extension
fn strip_collision_suffix(name: &str) -> Cow<'_, str> {
    let (stem, ext) = split_extension(name);
    match stem.rsplit_once('_') {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_hexdigit()) => {
            Cow::Owned(format!("{}{}", head, ext))
        }
        _ => Cow::Borrowed(name),
    }
}

/// `YYYYMMDD_HHMMSS`, optionally followed by `_<counter or hex>`
fn is_stamp_with_counter(middle: &str) -> bool {
    let Some(stamp) = middle.get(..STAMP_LEN) else {
        return false;
    };
    let is_stamp = stamp.char_indices().all(|(i, c)| {
        if i == 8 {
            c == '_'
        } else {
            c.is_ascii_digit()
        }
    });
    let counter = &middle[STAMP_LEN..];
    is_stamp
        && (counter.is_empty()
            || counter
                .strip_prefix('_')
                .is_some_and(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_hexdigit())))
}

/// Tie-break for equal timestamps: `x_10.log` sorts after `x_9.log`
fn name_order_key(path: &Path) -> (usize, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (name.len(), name)
}
