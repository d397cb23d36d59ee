use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One upstream draw item exactly as received.
pub type RawItem = serde_json::Value;

// ---------------------------------------------------------------------------
// Derived draw attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawColor {
    Red,
    Green,
    Violet,
    Unknown,
}

impl std::fmt::Display for DrawColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DrawColor::Red => "Red",
            DrawColor::Green => "Green",
            DrawColor::Violet => "Violet",
            DrawColor::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawSize {
    Big,
    Small,
    Unknown,
}

impl std::fmt::Display for DrawSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DrawSize::Big => "Big",
            DrawSize::Small => "Small",
            DrawSize::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Draw record
// ---------------------------------------------------------------------------

/// A normalized draw, ready to persist. Color and size are always derived
/// from `winning_number`; nothing else sets them.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub period: i64,
    /// Local observation time, not upstream's draw time.
    pub draw_time: DateTime<Utc>,
    pub winning_number: i64,
    pub result_color: DrawColor,
    pub result_size: DrawSize,
    pub raw_payload: RawItem,
}

/// Why a single item was dropped from a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRejection {
    MissingPeriod,
    MissingNumber,
    InvalidPeriod,
    InvalidNumber,
}

impl std::fmt::Display for ItemRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemRejection::MissingPeriod => "missing_period",
            ItemRejection::MissingNumber => "missing_number",
            ItemRejection::InvalidPeriod => "invalid_period",
            ItemRejection::InvalidNumber => "invalid_number",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Tick outcomes
// ---------------------------------------------------------------------------

/// Pipeline stage a tick was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStage {
    Fetching,
    Parsing,
    Persisting,
}

impl std::fmt::Display for TickStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TickStage::Fetching => "fetching",
            TickStage::Parsing => "parsing",
            TickStage::Persisting => "persisting",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Items found in the upstream envelope.
    pub items: usize,
    /// Rows newly inserted this tick.
    pub saved: usize,
    /// Items whose period was already stored.
    pub duplicates: usize,
    /// Items dropped for missing or non-integer period/number.
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickOutcome {
    Completed(TickSummary),
    Failed { stage: TickStage, error: String },
    /// Another tick held the guard; nothing ran.
    Busy,
}

impl TickOutcome {
    pub fn saved(&self) -> usize {
        match self {
            TickOutcome::Completed(summary) => summary.saved,
            _ => 0,
        }
    }
}
