use crate::pipeline::renewals::{LineKind, RenewalLine, RuleBook};

pub(super) fn pair(deinstall: &str, install: &str) -> (String, String) {
    (deinstall.to_string(), install.to_string())
}

/// Rule book used across the group tests: the two standard renewal pairs,
/// one prohibited reference per movement kind, and two battery references.
pub(super) fn book() -> RuleBook {
    RuleBook::new(
        [
            pair("BF039", "BF145"),
            pair("BF039", "BF149"),
            pair("BF039M", "BF145"),
        ],
        ["ZDES".to_string()],
        ["ZINS".to_string()],
        ["PIL01".to_string(), "PIL02".to_string()],
        [pair("BF039", "BF145"), pair("BF039", "BF149")],
    )
}

pub(super) fn line(kind: LineKind, reference: &str, quantity: f64) -> RenewalLine {
    line_for("C-500", "M-77", "WO-1001", kind, reference, quantity)
}

pub(super) fn line_for(
    client: &str,
    maintenance: &str,
    order: &str,
    kind: LineKind,
    reference: &str,
    quantity: f64,
) -> RenewalLine {
    RenewalLine {
        order_no: order.to_string(),
        maintenance_no: maintenance.to_string(),
        date: "2025-06-01".to_string(),
        client_no: client.to_string(),
        reference: reference.to_string(),
        kind,
        price: Some(12.5),
        quantity,
        fee: None,
        technician: "T-9".to_string(),
        payment: "CARD".to_string(),
    }
}
