/*!
 * Data model shared by the synchronization engine and its collaborators.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item on the study service (a subject id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a remote synonym record (a study material id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a sync session, issued in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of content whose meaning synonyms are synchronized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier on the study service
    pub id: ItemId,
    /// Label that gets translated (the primary meaning)
    pub label: String,
    /// Synonyms currently stored remotely, in remote order
    #[serde(default)]
    pub current_synonyms: Vec<String>,
    /// Level the item belongs to
    pub level: u32,
}

impl Item {
    /// Create a new item
    pub fn new(id: u64, label: impl Into<String>, current_synonyms: Vec<String>, level: u32) -> Self {
        Self {
            id: ItemId(id),
            label: label.into(),
            current_synonyms,
            level,
        }
    }
}

/// Reference to a synonym record stored on the study service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    /// Record identifier
    pub id: RecordId,
    /// Item the record belongs to
    pub item_id: ItemId,
    /// Synonyms stored in the record
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Strategy for folding a translation into an existing synonym set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// The translation becomes the only synonym
    Replace,
    /// The translation is appended unless already present
    #[default]
    SmartMerge,
    /// All synonyms are removed
    Delete,
}

impl Policy {
    /// Whether this policy needs a translation at all
    pub fn needs_translation(&self) -> bool {
        !matches!(self, Self::Delete)
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Replace => "Replace",
            Self::SmartMerge => "Smart merge",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Replace => "replace",
            Self::SmartMerge => "smart-merge",
            Self::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Policy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "replace" => Ok(Self::Replace),
            "smart-merge" | "smartmerge" | "merge" => Ok(Self::SmartMerge),
            "delete" => Ok(Self::Delete),
            _ => Err(anyhow::anyhow!("Invalid policy: {}", s)),
        }
    }
}

/// Per-item result of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A new remote record was created
    Created,
    /// An existing remote record was updated
    Updated,
    /// No write was necessary
    Skipped,
    /// The item could not be synchronized
    Failed(String),
}

impl Outcome {
    /// Whether this outcome counts as a success
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Counters accumulated over a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Stats {
    /// Create a zeroed stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the counters
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// Items that did not fail
    pub fn successful(&self) -> usize {
        self.created + self.updated + self.skipped
    }

    /// All items that produced an outcome
    pub fn total(&self) -> usize {
        self.successful() + self.failed
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created, self.updated, self.skipped, self.failed
        )
    }
}

/// Lifecycle of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Criteria for selecting items from the study service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Levels to include; empty means all levels
    #[serde(default)]
    pub levels: Vec<u32>,
    /// Subject type to list
    #[serde(default = "default_subject_type")]
    pub subject_type: String,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self::new(default_subject_type(), Vec::new())
    }
}

impl ItemFilter {
    /// Filter for the given levels of the given subject type
    pub fn new(subject_type: impl Into<String>, levels: Vec<u32>) -> Self {
        Self {
            levels,
            subject_type: subject_type.into(),
        }
    }
}

pub(crate) fn default_subject_type() -> String {
    "radical".to_string()
}

/// Outcome of one item, as recorded by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub item_id: ItemId,
    pub label: String,
    pub outcome: Outcome,
}

/// Caller-owned summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Session the run belonged to
    pub session_id: SessionId,
    /// Terminal state of the run
    pub state: RunState,
    /// Counters for the items attempted by this run
    pub stats: Stats,
    /// Number of items that produced an outcome
    pub attempted: usize,
    /// Number of items handed to the run
    pub total: usize,
    /// Per-item outcomes, in processing order
    pub items: Vec<ItemReport>,
}

impl RunReport {
    /// Whether every item produced an outcome
    pub fn is_complete(&self) -> bool {
        self.attempted == self.total
    }
}
