use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::domain::{LineKind, RenewalLine};
use crate::pipeline::PipelineError;

pub(crate) const REQUIRED_HEADERS: [&str; 11] = [
    "WO",
    "MANT",
    "FECHA",
    "CLIENTE",
    "REFERENCIA",
    "TIPO",
    "PRECIO",
    "CANTIDAD",
    "CUOTA",
    "TECNICO",
    "PAGO",
];

/// Reads the headered renewal feed and keeps only lines the rules can judge:
/// a recognized kind, the four critical identifiers present, and a numeric
/// quantity. Extra columns are ignored.
pub(crate) fn parse_lines<R: Read>(reader: R) -> Result<Vec<RenewalLine>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    check_headers(csv_reader.headers()?)?;

    let mut lines = Vec::new();
    for record in csv_reader.deserialize::<RenewalRow>() {
        let row = record?;
        if let Some(line) = row.into_line() {
            lines.push(line);
        }
    }

    Ok(lines)
}

fn check_headers(headers: &csv::StringRecord) -> Result<(), PipelineError> {
    let present: Vec<&str> = headers.iter().map(str::trim).collect();
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|required| !present.contains(required))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Schema(format!(
            "renewal feed is missing columns: {}",
            missing.join(", ")
        )))
    }
}

#[derive(Debug, Deserialize)]
struct RenewalRow {
    #[serde(rename = "WO", default, deserialize_with = "empty_string_as_none")]
    order_no: Option<String>,
    #[serde(rename = "MANT", default, deserialize_with = "empty_string_as_none")]
    maintenance_no: Option<String>,
    #[serde(rename = "FECHA", default)]
    date: String,
    #[serde(rename = "CLIENTE", default, deserialize_with = "empty_string_as_none")]
    client_no: Option<String>,
    #[serde(
        rename = "REFERENCIA",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    reference: Option<String>,
    #[serde(rename = "TIPO", default)]
    kind: String,
    #[serde(rename = "PRECIO", default)]
    price: String,
    #[serde(rename = "CANTIDAD", default)]
    quantity: String,
    #[serde(rename = "CUOTA", default)]
    fee: String,
    #[serde(rename = "TECNICO", default)]
    technician: String,
    #[serde(rename = "PAGO", default)]
    payment: String,
}

impl RenewalRow {
    fn into_line(self) -> Option<RenewalLine> {
        let kind = LineKind::from_code(&self.kind)?;
        let order_no = self.order_no?;
        let reference = self.reference?;
        let maintenance_no = self.maintenance_no?;
        let client_no = self.client_no?;
        let quantity = parse_number(&self.quantity)?;

        Some(RenewalLine {
            order_no,
            maintenance_no,
            date: self.date.trim().to_string(),
            client_no,
            reference,
            kind,
            price: parse_number(&self.price),
            quantity,
            fee: parse_number(&self.fee),
            technician: self.technician.trim().to_string(),
            payment: self.payment.trim().to_string(),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
