use serde::{Deserialize, Serialize};

/// Canonical column order of the normalized feed: the 25 mapped fields in
/// source position order, then the two derived columns. Downstream consumers
/// (staging, correlation output, the export preview) rely on this order.
pub const WOQ_COLUMNS: [&str; 27] = [
    "DC",
    "N_WO",
    "TIPO",
    "TIPO2",
    "CONTRATO",
    "DEALER",
    "STATUS1",
    "STATUS2",
    "CERRADO",
    "F_SIST",
    "CLIENTE",
    "PERU",
    "IMP_INST",
    "IMP_2",
    "IMP_3",
    "IMP_4",
    "M_CREADOR",
    "F_FACT",
    "T_PRICE",
    "F_F",
    "CERRADO2",
    "MTRIC",
    "INSTALACION",
    "N_CONTRATO",
    "MATRI_CERRADO",
    "ORDEN_CONTRATO",
    "ES_CERRADO",
];

/// One normalized work-order-query record. Field declaration order matches
/// [`WOQ_COLUMNS`]; serde names keep the canonical spelling on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WoqRecord {
    #[serde(rename = "DC")]
    pub dc: String,
    #[serde(rename = "N_WO")]
    pub order_no: String,
    #[serde(rename = "TIPO")]
    pub kind: String,
    #[serde(rename = "TIPO2")]
    pub kind_detail: String,
    #[serde(rename = "CONTRATO")]
    pub contract_no: String,
    #[serde(rename = "DEALER")]
    pub dealer: String,
    #[serde(rename = "STATUS1")]
    pub status1: String,
    #[serde(rename = "STATUS2")]
    pub status2: String,
    #[serde(rename = "CERRADO")]
    pub closed_marker: String,
    #[serde(rename = "F_SIST")]
    pub system_date: String,
    #[serde(rename = "CLIENTE")]
    pub client_name: String,
    #[serde(rename = "PERU")]
    pub region: String,
    #[serde(rename = "IMP_INST")]
    pub install_amount: String,
    #[serde(rename = "IMP_2")]
    pub amount_2: String,
    #[serde(rename = "IMP_3")]
    pub amount_3: String,
    #[serde(rename = "IMP_4")]
    pub amount_4: String,
    #[serde(rename = "M_CREADOR")]
    pub created_by: String,
    #[serde(rename = "F_FACT")]
    pub invoice_date: String,
    #[serde(rename = "T_PRICE")]
    pub total_price: String,
    #[serde(rename = "F_F")]
    pub billing_flag: String,
    #[serde(rename = "CERRADO2")]
    pub closed_marker_alt: String,
    #[serde(rename = "MTRIC")]
    pub metric_code: String,
    #[serde(rename = "INSTALACION")]
    pub installation: String,
    #[serde(rename = "N_CONTRATO")]
    pub contract_line: String,
    #[serde(rename = "MATRI_CERRADO")]
    pub roster_closed: String,
    #[serde(rename = "ORDEN_CONTRATO")]
    pub contract_ordinal: u32,
    #[serde(rename = "ES_CERRADO")]
    pub is_closed: bool,
}

impl WoqRecord {
    /// Builds a record from the 25 mapped values in canonical order. Derived
    /// fields start at their resting values and are filled by the normalizer.
    pub(crate) fn from_canonical(values: [String; 25]) -> Self {
        let [dc, order_no, kind, kind_detail, contract_no, dealer, status1, status2, closed_marker, system_date, client_name, region, install_amount, amount_2, amount_3, amount_4, created_by, invoice_date, total_price, billing_flag, closed_marker_alt, metric_code, installation, contract_line, roster_closed] =
            values;
        Self {
            dc,
            order_no,
            kind,
            kind_detail,
            contract_no,
            dealer,
            status1,
            status2,
            closed_marker,
            system_date,
            client_name,
            region,
            install_amount,
            amount_2,
            amount_3,
            amount_4,
            created_by,
            invoice_date,
            total_price,
            billing_flag,
            closed_marker_alt,
            metric_code,
            installation,
            contract_line,
            roster_closed,
            contract_ordinal: 0,
            is_closed: false,
        }
    }
}
