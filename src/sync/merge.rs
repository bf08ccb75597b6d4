/*!
 * Merge policies for synonym sets.
 *
 * Folding a translation into the synonyms already stored remotely is a pure
 * function of the current set, the translation and the selected policy. All
 * comparisons ignore case and surrounding whitespace, while the output keeps
 * the casing of the first occurrence of every synonym.
 */

use std::collections::HashSet;

use crate::errors::SyncError;

use super::models::Policy;

/// Maximum number of synonyms the study service accepts per record
pub const DEFAULT_MAX_SYNONYMS: usize = 8;

/// Result of applying a policy to a synonym set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Synonym set to store remotely
    pub next_synonyms: Vec<String>,
    /// Whether `next_synonyms` differs from the current set, i.e. a write is needed
    pub changed: bool,
}

impl MergeResult {
    fn unchanged(current: &[String]) -> Self {
        Self {
            next_synonyms: current.to_vec(),
            changed: false,
        }
    }
}

/// Applies merge policies and validates their results
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine {
    max_synonyms: usize,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SYNONYMS)
    }
}

impl MergeEngine {
    /// Create an engine that rejects sets larger than `max_synonyms`
    pub fn new(max_synonyms: usize) -> Self {
        Self { max_synonyms }
    }

    /// Compute the next synonym set for `current` under `policy`
    ///
    /// `translated` is ignored by [`Policy::Delete`]. A blank translation under
    /// any other policy, or a result over the size limit, is a validation error.
    pub fn apply(&self, current: &[String], translated: &str, policy: Policy) -> Result<MergeResult, SyncError> {
        let result = match policy {
            Policy::Replace => {
                let translated = non_blank(translated)?;
                let next_synonyms = dedup([translated]);
                let changed = !set_equals(current, &next_synonyms);
                MergeResult { next_synonyms, changed }
            }
            Policy::SmartMerge => {
                let translated = non_blank(translated)?;
                if contains(current, translated) {
                    MergeResult::unchanged(current)
                } else {
                    let next_synonyms = dedup(current.iter().map(String::as_str).chain([translated]));
                    MergeResult { next_synonyms, changed: true }
                }
            }
            // An empty set never needs a write
            Policy::Delete => MergeResult {
                next_synonyms: Vec::new(),
                changed: !current.is_empty(),
            },
        };

        if result.changed && result.next_synonyms.len() > self.max_synonyms {
            return Err(SyncError::Validation(format!(
                "{} synonyms exceed the limit of {}",
                result.next_synonyms.len(),
                self.max_synonyms
            )));
        }

        Ok(result)
    }
}

/// Apply `policy` with the default size limit
pub fn merge(current: &[String], translated: &str, policy: Policy) -> Result<MergeResult, SyncError> {
    MergeEngine::default().apply(current, translated, policy)
}

/// Comparison key of a synonym
pub fn normalize(synonym: &str) -> String {
    synonym.trim().to_lowercase()
}

/// Whether two synonym sequences hold the same synonyms, ignoring case and order
pub fn set_equals(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<String> = a.iter().map(|s| normalize(s)).collect();
    let mut right: Vec<String> = b.iter().map(|s| normalize(s)).collect();
    left.sort();
    right.sort();
    left == right
}

/// Whether `synonyms` contains `candidate`, ignoring case
pub fn contains(synonyms: &[String], candidate: &str) -> bool {
    let key = normalize(candidate);
    synonyms.iter().any(|s| normalize(s) == key)
}

/// Remove case-insensitive duplicates and blank entries, keeping first occurrences
pub fn dedup<'a>(synonyms: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for synonym in synonyms {
        let trimmed = synonym.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
    }
    result
}

fn non_blank(translated: &str) -> Result<&str, SyncError> {
    let trimmed = translated.trim();
    if trimmed.is_empty() {
        return Err(SyncError::Validation(
            "translation is empty, refusing to store an empty synonym set".to_string(),
        ));
    }
    Ok(trimmed)
}
