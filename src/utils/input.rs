//! Client-side email format checks and batch loading.

use crate::core::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

static EMAIL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Email format regex failed to compile. This is a bug.")
});

/// Simple shape check: something, one `@`, something with a dot. No whitespace.
pub fn is_valid_email_format(candidate: &str) -> bool {
    EMAIL_FORMAT.is_match(candidate)
}

/// Trims `candidate` and returns it if it passes the format check.
pub fn validate_email(candidate: &str) -> Result<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || !is_valid_email_format(trimmed) {
        return Err(AppError::InvalidEmailFormat(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Filters raw candidates down to a submittable batch.
///
/// Invalid entries are dropped, duplicates are removed case-insensitively
/// keeping the first occurrence, and the batch is rejected outright when more
/// than `max_batch_size` addresses remain.
pub fn prepare_batch<I, S>(candidates: I, max_batch_size: usize) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut batch = Vec::new();
    let mut rejected = 0usize;

    for candidate in candidates {
        let trimmed = candidate.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if !is_valid_email_format(trimmed) {
            rejected += 1;
            tracing::debug!("Dropping malformed address: {}", trimmed);
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            batch.push(trimmed.to_string());
        }
    }

    if rejected > 0 {
        tracing::warn!("Dropped {} malformed address(es) from input.", rejected);
    }
    if batch.len() > max_batch_size {
        return Err(AppError::BatchTooLarge {
            count: batch.len(),
            max: max_batch_size,
        });
    }
    Ok(batch)
}

/// Splits file content into candidate tokens. Accepts one address per line or
/// comma/semicolon/whitespace separated lists, and skips a leading `email` header.
fn tokenize(content: &str) -> impl Iterator<Item = &str> {
    content
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|t| t.trim_matches('"').trim())
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("email"))
}

/// Loads a batch from a text or CSV file.
pub fn load_batch_from_file(path: impl AsRef<Path>, max_batch_size: usize) -> Result<Vec<String>> {
    let path = path.as_ref();
    tracing::debug!("Reading email list from {}", path.display());
    let content = fs::read_to_string(path)?;
    prepare_batch(tokenize(&content), max_batch_size)
}
