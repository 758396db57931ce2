use std::collections::HashSet;

use super::config::{RuleBook, F057_REFERENCE};
use super::domain::{GroupOutcome, LineKind, OutcomeState, RenewalLine};

/// Applies the rule ladder to one (client, maintenance) group and resolves
/// the outcome broadcast to all of its lines.
pub(crate) fn evaluate_group(lines: &[RenewalLine], book: &RuleBook) -> GroupOutcome {
    let mut errors: Vec<String> = Vec::new();

    let deinstall: Vec<&RenewalLine> = lines
        .iter()
        .filter(|line| line.kind == LineKind::Deinstall)
        .collect();
    let install: Vec<&RenewalLine> = lines
        .iter()
        .filter(|line| line.kind == LineKind::Install)
        .collect();

    let qty_deinstall: f64 = deinstall.iter().map(|line| line.quantity).sum();
    // Battery items never count toward the install total.
    let qty_install: f64 = install
        .iter()
        .filter(|line| !book.is_battery(&line.reference))
        .map(|line| line.quantity)
        .sum();
    let qty_total = qty_deinstall + qty_install;

    let deinstall_refs: HashSet<String> = deinstall
        .iter()
        .map(|line| line.reference_key())
        .collect();
    let install_refs: HashSet<String> = install.iter().map(|line| line.reference_key()).collect();

    let has_battery = install_refs
        .iter()
        .any(|reference| book.is_battery(reference));
    let has_f057 = install_refs.contains(F057_REFERENCE);

    // Sign discipline applies to every line, batteries included.
    for line in lines {
        match line.kind {
            LineKind::Deinstall if line.quantity >= 0.0 => errors.push(format!(
                "{}: DMCE must carry a negative quantity",
                line.reference
            )),
            LineKind::Install if line.quantity <= 0.0 => errors.push(format!(
                "{}: AMCE must carry a positive quantity",
                line.reference
            )),
            _ => {}
        }
    }

    for line in lines {
        if book.prohibits(line.kind, &line.reference) {
            errors.push(format!(
                "{} ({}): reference not allowed for this movement",
                line.reference_key(),
                line.kind.code()
            ));
        }
    }

    if has_f057 && deinstall.is_empty() {
        errors.push("F057 requires a removal line in the group".to_string());
    }

    if !deinstall.is_empty() && !install.is_empty() {
        let any_permitted = deinstall_refs.iter().any(|d| {
            install_refs
                .iter()
                .any(|a| book.permits_pair(d, a))
        });
        if !any_permitted {
            errors.push("no approved DMCE to AMCE combination in the group".to_string());
        }
    }

    let f057_justified = deinstall_refs.iter().any(|d| {
        install_refs
            .iter()
            .any(|a| book.justifies_f057(d, a))
    });

    if has_f057 && !f057_justified {
        errors.push("F057 without a justifying renewal pair".to_string());
    }

    if errors.is_empty() && deinstall.is_empty() && !has_f057 && has_battery {
        errors.push("battery install without an associated renewal".to_string());
    }

    let mut note: Option<String> = None;
    let state = if !errors.is_empty() {
        OutcomeState::Incorrect
    } else if qty_total == 0.0 {
        OutcomeState::Correct
    } else if qty_total == 1.0 && ((has_f057 && f057_justified) || has_battery) {
        OutcomeState::Correct
    } else if qty_total == 1.0 && !has_f057 {
        note = Some("quantity imbalance without F057".to_string());
        OutcomeState::Warning
    } else {
        note = Some(format!("critical quantity imbalance (total: {})", qty_total));
        OutcomeState::Incorrect
    };

    if let Some(note) = note {
        errors.push(note);
    }

    let observations = if errors.is_empty() {
        let mut text = "Renewal complete".to_string();
        if has_battery {
            text.push_str(" + includes battery items");
        }
        text
    } else {
        join_unique(&errors)
    };

    GroupOutcome {
        qty_deinstall,
        qty_install,
        qty_total,
        state,
        observations,
        rpa: state == OutcomeState::Correct,
    }
}

/// Deduplicates findings while preserving first-occurrence order.
fn join_unique(errors: &[String]) -> String {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for error in errors {
        if seen.insert(error.as_str()) {
            unique.push(error.as_str());
        }
    }
    unique.join("; ")
}
