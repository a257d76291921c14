//! Video id assignment and filename-derived titles.
//!
//! An id doubles as the source file's on-disk name:
//! `{unix_millis}-{sequence}__{sanitized original name}`. The sequence is a
//! monotonic counter owned by the generator, so two identically named files uploaded in
//! the same millisecond still receive distinct ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]+").expect("static regex"));

static ID_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:-\d+)?__").expect("static regex"));

/// Hands out collision-free ids for uploaded files.
#[derive(Debug, Default)]
pub struct IdGenerator {
    sequence: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh id for a file uploaded as `original_name`.
    pub fn next_id(&self, original_name: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{millis}-{seq}__{}", sanitize_file_name(original_name))
    }
}

/// Reduce a client-supplied filename to `[A-Za-z0-9_.-]`.
///
/// Any directory components are dropped first, then every run of other
/// characters collapses to a single `_`.
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = base_name(original_name);
    let safe = UNSAFE_RUN.replace_all(base, "_");
    if safe.is_empty() {
        "upload".to_string()
    } else {
        safe.into_owned()
    }
}

/// Drop the final `.ext` from a name, if there is one.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => &name[..pos],
        _ => name,
    }
}

/// Title for a freshly uploaded file: the client's filename minus extension.
pub fn title_from_original_name(original_name: &str) -> String {
    strip_extension(base_name(original_name)).trim().to_string()
}

/// Title used when the sidecar has no record for `id`.
pub fn default_title(id: &str) -> String {
    let without_prefix = ID_PREFIX.replace(id, "");
    let title = strip_extension(&without_prefix).trim();
    if title.is_empty() {
        id.to_string()
    } else {
        title.to_string()
    }
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
