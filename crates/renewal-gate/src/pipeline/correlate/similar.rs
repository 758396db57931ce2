//! Near-match lookup for order numbers, a diagnostic aid for feeds with
//! typos. Never consulted by eligibility or export decisions.

use serde::Serialize;

use super::lookup_key;
use crate::pipeline::woq::WoqRecord;

/// Minimum ratio for a candidate to count as a near match.
pub const NEAR_MATCH_THRESHOLD: f64 = 0.8;

/// One candidate order number with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearMatch {
    pub order_no: String,
    pub ratio: f64,
}

/// Similarity of two strings as `2 * common / (len_a + len_b)`, where
/// `common` is the length of their longest common subsequence. Two empty
/// strings score 1.0.
pub fn match_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Two rolling rows instead of the full table.
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let common = previous[b.len()];
    2.0 * common as f64 / (a.len() + b.len()) as f64
}

/// Lists records whose order number scores at or above the threshold against
/// the probe, best first. Keys are trimmed and uppercased the same way the
/// correlator joins them; blank order numbers are skipped.
pub fn near_matches(probe: &str, records: &[WoqRecord]) -> Vec<NearMatch> {
    let probe = lookup_key(probe);
    let mut hits: Vec<NearMatch> = records
        .iter()
        .filter_map(|record| {
            let candidate = lookup_key(&record.order_no);
            if candidate.is_empty() {
                return None;
            }
            let ratio = match_ratio(&probe, &candidate);
            (ratio >= NEAR_MATCH_THRESHOLD).then(|| NearMatch {
                order_no: record.order_no.trim().to_string(),
                ratio,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        b.ratio
            .partial_cmp(&a.ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.order_no.cmp(&b.order_no))
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order: &str) -> WoqRecord {
        WoqRecord {
            order_no: order.to_string(),
            ..WoqRecord::default()
        }
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(match_ratio("WO123", "WO123"), 1.0);
        assert_eq!(match_ratio("", ""), 1.0);
    }

    #[test]
    fn one_digit_off_scores_exactly_the_threshold() {
        assert_eq!(match_ratio("WO123", "WO124"), 0.8);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(match_ratio("ABC", "XYZ"), 0.0);
        assert_eq!(match_ratio("ABC", ""), 0.0);
    }

    #[test]
    fn near_matches_filter_and_sort_best_first() {
        let records = [record("WO124"), record("WO123"), record("AA999"), record("  ")];
        let hits = near_matches("wo123", &records);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].order_no, "WO123");
        assert_eq!(hits[0].ratio, 1.0);
        assert_eq!(hits[1].order_no, "WO124");
        assert_eq!(hits[1].ratio, 0.8);
    }

    #[test]
    fn ties_break_on_the_order_number() {
        let records = [record("WO129"), record("WO124")];
        let hits = near_matches("WO123", &records);
        assert_eq!(hits[0].order_no, "WO124");
        assert_eq!(hits[1].order_no, "WO129");
    }
}
