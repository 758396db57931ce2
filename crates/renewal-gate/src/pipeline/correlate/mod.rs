//! WOQ-driven correlation against validated renewal outcomes.
//!
//! Every WOQ record is kept, in order, with two appended columns: the matched
//! outcome state and the robot eligibility flag. The join key is the order
//! number, trimmed and uppercased on both sides.

pub mod similar;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::renewals::{OutcomeState, ValidatedLine};
use super::woq::WoqRecord;
use crate::pipeline::PipelineError;

/// Three-valued robot eligibility: YES to hand over, NO when the matched
/// order is already closed, empty when the record found no Correct match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RpaEligibility {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
    #[serde(rename = "")]
    Unmatched,
}

impl RpaEligibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::Unmatched => "",
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value.trim() {
            "YES" => Self::Yes,
            "NO" => Self::No,
            _ => Self::Unmatched,
        }
    }
}

/// One WOQ record with the two appended correlation columns.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedRecord {
    #[serde(flatten)]
    pub woq: WoqRecord,
    #[serde(rename = "OUTCOME_STATE")]
    pub outcome_state: Option<OutcomeState>,
    #[serde(rename = "RPA_ELIGIBLE")]
    pub rpa_eligible: RpaEligibility,
}

/// Counters over one correlation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossingStats {
    pub total: usize,
    pub closed: usize,
    pub pending: usize,
    pub eligible: usize,
    pub unmatched: usize,
    pub cross_rate_pct: f64,
}

/// Output of one correlation pass.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationRun {
    pub records: Vec<CorrelatedRecord>,
    pub stats: CrossingStats,
}

pub(crate) fn lookup_key(order_no: &str) -> String {
    order_no.trim().to_uppercase()
}

/// Joins the normalized WOQ table against validated outcomes.
///
/// Every validated line is indexed regardless of outcome (last write wins for
/// the state map) while Correct membership accumulates separately; a record
/// whose order matched only non-Correct outcomes stays unmatched for
/// eligibility and statistics. Empty keys never match.
pub fn correlate(
    validated: &[ValidatedLine],
    woq: &[WoqRecord],
) -> Result<CorrelationRun, PipelineError> {
    if validated.is_empty() {
        return Err(PipelineError::Crossing(
            "no validated renewal lines available to correlate".to_string(),
        ));
    }
    if woq.is_empty() {
        return Err(PipelineError::Crossing(
            "no normalized WOQ records available to correlate".to_string(),
        ));
    }

    let mut state_by_order: HashMap<String, OutcomeState> = HashMap::new();
    let mut correct_orders: HashSet<String> = HashSet::new();
    for line in validated {
        let key = lookup_key(&line.line.order_no);
        if key.is_empty() {
            continue;
        }
        state_by_order.insert(key.clone(), line.outcome.state);
        if line.outcome.state == OutcomeState::Correct {
            correct_orders.insert(key);
        }
    }

    let mut records = Vec::with_capacity(woq.len());
    let mut closed = 0usize;
    let mut eligible = 0usize;
    let mut unmatched = 0usize;

    for record in woq {
        if record.is_closed {
            closed += 1;
        }

        let key = lookup_key(&record.order_no);
        let outcome_state = if key.is_empty() {
            None
        } else {
            state_by_order.get(&key).copied()
        };

        let rpa_eligible = if !key.is_empty() && correct_orders.contains(&key) {
            if record.is_closed {
                RpaEligibility::No
            } else {
                eligible += 1;
                RpaEligibility::Yes
            }
        } else {
            unmatched += 1;
            RpaEligibility::Unmatched
        };

        records.push(CorrelatedRecord {
            woq: record.clone(),
            outcome_state,
            rpa_eligible,
        });
    }

    let stats = CrossingStats {
        total: woq.len(),
        closed,
        pending: woq.len() - closed,
        eligible,
        unmatched,
        cross_rate_pct: crate::pipeline::round2(eligible as f64 / woq.len() as f64 * 100.0),
    };

    Ok(CorrelationRun { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::renewals::{GroupOutcome, LineKind, RenewalLine};

    pub(super) fn validated(order: &str, state: OutcomeState) -> ValidatedLine {
        ValidatedLine {
            line: RenewalLine {
                order_no: order.to_string(),
                maintenance_no: "M-1".to_string(),
                date: "2025-06-01".to_string(),
                client_no: "C-1".to_string(),
                reference: "BF039".to_string(),
                kind: LineKind::Deinstall,
                price: None,
                quantity: -1.0,
                fee: None,
                technician: String::new(),
                payment: String::new(),
            },
            outcome: GroupOutcome {
                qty_deinstall: -1.0,
                qty_install: 1.0,
                qty_total: 0.0,
                state,
                observations: String::new(),
                rpa: state == OutcomeState::Correct,
            },
        }
    }

    pub(super) fn woq_record(order: &str, closed: bool) -> WoqRecord {
        WoqRecord {
            order_no: order.to_string(),
            contract_no: "700".to_string(),
            contract_ordinal: 1,
            is_closed: closed,
            ..WoqRecord::default()
        }
    }

    #[test]
    fn partitions_records_into_yes_no_and_empty() {
        let validated = [
            validated("A", OutcomeState::Correct),
            validated("B", OutcomeState::Incorrect),
        ];
        let woq = [
            woq_record("A", false),
            woq_record("A", true),
            woq_record("B", false),
            woq_record("C", false),
        ];
        let run = correlate(&validated, &woq).expect("correlates");

        assert_eq!(run.records[0].rpa_eligible, RpaEligibility::Yes);
        assert_eq!(run.records[0].outcome_state, Some(OutcomeState::Correct));
        assert_eq!(run.records[1].rpa_eligible, RpaEligibility::No);
        assert_eq!(run.records[2].rpa_eligible, RpaEligibility::Unmatched);
        assert_eq!(run.records[2].outcome_state, Some(OutcomeState::Incorrect));
        assert_eq!(run.records[3].rpa_eligible, RpaEligibility::Unmatched);
        assert_eq!(run.records[3].outcome_state, None);

        assert_eq!(run.stats.total, 4);
        assert_eq!(run.stats.closed, 1);
        assert_eq!(run.stats.pending, 3);
        assert_eq!(run.stats.eligible, 1);
        assert_eq!(run.stats.unmatched, 2);
        assert_eq!(run.stats.cross_rate_pct, 25.0);
    }

    #[test]
    fn lookup_trims_and_uppercases_both_sides() {
        let validated = [validated("  wo-9 ", OutcomeState::Correct)];
        let woq = [woq_record("WO-9", false)];
        let run = correlate(&validated, &woq).expect("correlates");
        assert_eq!(run.records[0].rpa_eligible, RpaEligibility::Yes);
    }

    #[test]
    fn empty_keys_never_match() {
        let validated = [
            validated("   ", OutcomeState::Correct),
            validated("A", OutcomeState::Correct),
        ];
        let woq = [woq_record("", false)];
        let run = correlate(&validated, &woq).expect("correlates");
        assert_eq!(run.records[0].rpa_eligible, RpaEligibility::Unmatched);
        assert_eq!(run.records[0].outcome_state, None);
    }

    #[test]
    fn either_side_empty_is_a_crossing_error() {
        let lines = [validated("A", OutcomeState::Correct)];
        let records = [woq_record("A", false)];

        let error = correlate(&[], &records).expect_err("validated side empty");
        assert!(matches!(error, PipelineError::Crossing(_)));

        let error = correlate(&lines, &[]).expect_err("woq side empty");
        assert!(matches!(error, PipelineError::Crossing(_)));
    }

    #[test]
    fn cross_rate_keeps_two_decimals() {
        let validated = [validated("A", OutcomeState::Correct)];
        let woq = [
            woq_record("A", false),
            woq_record("X", false),
            woq_record("Y", false),
        ];
        let run = correlate(&validated, &woq).expect("correlates");
        assert_eq!(run.stats.cross_rate_pct, 33.33);
    }

    #[test]
    fn correct_membership_survives_a_later_state() {
        // One order with a Correct line then an Incorrect one: the state map
        // keeps the last write, Correct membership accumulates.
        let validated = [
            validated("A", OutcomeState::Correct),
            validated("A", OutcomeState::Incorrect),
        ];
        let woq = [woq_record("A", false)];
        let run = correlate(&validated, &woq).expect("correlates");
        assert_eq!(run.records[0].outcome_state, Some(OutcomeState::Incorrect));
        assert_eq!(run.records[0].rpa_eligible, RpaEligibility::Yes);
    }
}
