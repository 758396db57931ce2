use serde::{Deserialize, Serialize};

/// Whether a renewal line installs the new unit or removes the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineKind {
    #[serde(rename = "AMCE")]
    Install,
    #[serde(rename = "DMCE")]
    Deinstall,
}

impl LineKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Install => "AMCE",
            Self::Deinstall => "DMCE",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AMCE" => Some(Self::Install),
            "DMCE" => Some(Self::Deinstall),
            _ => None,
        }
    }
}

/// One cleaned line from the renewal feed. Wire spelling is resolved by the
/// parser; everything downstream works with these fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalLine {
    pub order_no: String,
    pub maintenance_no: String,
    pub date: String,
    pub client_no: String,
    pub reference: String,
    pub kind: LineKind,
    pub price: Option<f64>,
    pub quantity: f64,
    pub fee: Option<f64>,
    pub technician: String,
    pub payment: String,
}

impl RenewalLine {
    /// Uppercased reference used by every rule comparison.
    pub fn reference_key(&self) -> String {
        self.reference.trim().to_ascii_uppercase()
    }
}

/// Classification assigned to a whole (client, maintenance) group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeState {
    Correct,
    Warning,
    Incorrect,
}

impl OutcomeState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Warning => "Warning",
            Self::Incorrect => "Incorrect",
        }
    }

    /// Wire labels are matched case-insensitively when read back.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "correct" => Some(Self::Correct),
            "warning" => Some(Self::Warning),
            "incorrect" => Some(Self::Incorrect),
            _ => None,
        }
    }
}

/// Aggregates and verdict computed once per group, then broadcast per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub qty_deinstall: f64,
    pub qty_install: f64,
    pub qty_total: f64,
    pub state: OutcomeState,
    pub observations: String,
    pub rpa: bool,
}

/// Staged row shape: the source line plus its group outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedLine {
    pub line: RenewalLine,
    pub outcome: GroupOutcome,
}

/// Line-level counters for one validation run. Warnings count as not-correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_lines: usize,
    pub correct_lines: usize,
    pub incorrect_lines: usize,
    pub groups: usize,
}

impl ValidationStats {
    pub fn success_rate_pct(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        crate::pipeline::round2(self.correct_lines as f64 / self.total_lines as f64 * 100.0)
    }
}
