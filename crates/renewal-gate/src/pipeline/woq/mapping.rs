use std::collections::HashSet;

/// Source position (0-based) to canonical column name, in canonical order.
/// The feed ships forty-plus positional columns; only these survive
/// normalization, everything else is discarded.
pub(crate) const POSITION_MAP: &[(usize, &str)] = &[
    (0, "DC"),
    (1, "N_WO"),
    (2, "TIPO"),
    (3, "TIPO2"),
    (5, "CONTRATO"),
    (6, "DEALER"),
    (7, "STATUS1"),
    (8, "STATUS2"),
    (10, "CERRADO"),
    (12, "F_SIST"),
    (13, "CLIENTE"),
    (14, "PERU"),
    (15, "IMP_INST"),
    (16, "IMP_2"),
    (17, "IMP_3"),
    (18, "IMP_4"),
    (20, "M_CREADOR"),
    (26, "F_FACT"),
    (31, "T_PRICE"),
    (32, "F_F"),
    (40, "CERRADO2"),
    (41, "MTRIC"),
    (42, "INSTALACION"),
    (43, "N_CONTRATO"),
    (44, "MATRI_CERRADO"),
];

/// Extracts the mapped values of one raw row in canonical order. Positions
/// past the end of a short row read as empty; every value is trimmed here so
/// nothing downstream has to re-clean.
pub(crate) fn mapped_values(row: &[String]) -> [String; 25] {
    std::array::from_fn(|slot| {
        let (position, _) = POSITION_MAP[slot];
        row.get(position)
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    })
}

/// Marker vocabularies for the CERRADO column, tried in priority order
/// against the distinct markers observed in a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClosedVocabulary {
    Cross,
    Affirmative,
    Boolean,
}

impl ClosedVocabulary {
    const ORDERED: [ClosedVocabulary; 3] = [Self::Cross, Self::Affirmative, Self::Boolean];

    pub(crate) fn members(self) -> &'static [&'static str] {
        match self {
            Self::Cross => &["X"],
            Self::Affirmative => &["SI", "SÍ", "S"],
            Self::Boolean => &["TRUE", "1"],
        }
    }

    /// `value` must already be trimmed and uppercased.
    pub(crate) fn matches(self, value: &str) -> bool {
        self.members().contains(&value)
    }

    pub(crate) fn detect(observed: &HashSet<String>) -> Option<Self> {
        Self::ORDERED
            .into_iter()
            .find(|vocabulary| observed.iter().any(|marker| vocabulary.matches(marker)))
    }
}
