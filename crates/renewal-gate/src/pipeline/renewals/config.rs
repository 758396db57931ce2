use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::LineKind;

/// Install reference that triggers the special justification rules.
pub const F057_REFERENCE: &str = "F057";

/// Reference data driving the group rules: the deinstall→install whitelist,
/// per-kind prohibition sets, battery references and the pairs that justify
/// an F057 install. Membership is case-insensitive; `new` normalizes every
/// entry once so lookups stay plain set probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBook {
    valid_pairs: HashSet<(String, String)>,
    deinstall_prohibited: HashSet<String>,
    install_prohibited: HashSet<String>,
    battery_references: HashSet<String>,
    f057_justifying_pairs: Vec<(String, String)>,
}

fn norm(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

impl RuleBook {
    pub fn new(
        valid_pairs: impl IntoIterator<Item = (String, String)>,
        deinstall_prohibited: impl IntoIterator<Item = String>,
        install_prohibited: impl IntoIterator<Item = String>,
        battery_references: impl IntoIterator<Item = String>,
        f057_justifying_pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            valid_pairs: valid_pairs
                .into_iter()
                .map(|(d, a)| (norm(&d), norm(&a)))
                .collect(),
            deinstall_prohibited: deinstall_prohibited.into_iter().map(|r| norm(&r)).collect(),
            install_prohibited: install_prohibited.into_iter().map(|r| norm(&r)).collect(),
            battery_references: battery_references.into_iter().map(|r| norm(&r)).collect(),
            f057_justifying_pairs: f057_justifying_pairs
                .into_iter()
                .map(|(d, a)| (norm(&d), norm(&a)))
                .collect(),
        }
    }

    pub fn permits_pair(&self, deinstall_ref: &str, install_ref: &str) -> bool {
        self.valid_pairs
            .contains(&(norm(deinstall_ref), norm(install_ref)))
    }

    pub fn prohibits(&self, kind: LineKind, reference: &str) -> bool {
        let key = norm(reference);
        match kind {
            LineKind::Deinstall => self.deinstall_prohibited.contains(&key),
            LineKind::Install => self.install_prohibited.contains(&key),
        }
    }

    pub fn is_battery(&self, reference: &str) -> bool {
        self.battery_references.contains(&norm(reference))
    }

    pub fn justifies_f057(&self, deinstall_ref: &str, install_ref: &str) -> bool {
        let pair = (norm(deinstall_ref), norm(install_ref));
        self.f057_justifying_pairs.contains(&pair)
    }
}

impl Default for RuleBook {
    /// The two renewal pairs every deployment starts from; site-specific
    /// prohibition and battery sets arrive through configuration.
    fn default() -> Self {
        let pairs = [("BF039", "BF145"), ("BF039", "BF149")];
        Self::new(
            pairs.map(|(d, a)| (d.to_string(), a.to_string())),
            Vec::<String>::new(),
            Vec::<String>::new(),
            Vec::<String>::new(),
            pairs.map(|(d, a)| (d.to_string(), a.to_string())),
        )
    }
}
