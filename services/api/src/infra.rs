//! Infrastructure collaborators: the SQLite staging store, controller
//! assembly and the shared HTTP state.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metrics_exporter_prometheus::PrometheusHandle;
use renewal_gate::config::AppConfig;
use renewal_gate::error::AppError;
use renewal_gate::pipeline::{
    LineKind, OutcomeState, PipelineController, PipelineError, RuleBook, StagingError,
    StagingStore, ValidatedLine, WoqRecord,
};
use rusqlite::{params, Connection};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Both staging tables live in one SQLite file. Writers replace a whole
/// table per call; the store only guards its connection.
pub(crate) struct SqliteStagingStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS staged_renewal_results (
    order_no TEXT NOT NULL,
    maintenance_no TEXT NOT NULL,
    line_date TEXT NOT NULL,
    client_no TEXT NOT NULL,
    reference TEXT NOT NULL,
    kind TEXT NOT NULL,
    price REAL,
    quantity REAL NOT NULL,
    fee REAL,
    technician TEXT NOT NULL,
    payment TEXT NOT NULL,
    qty_deinstall REAL NOT NULL,
    qty_install REAL NOT NULL,
    qty_total REAL NOT NULL,
    outcome TEXT NOT NULL,
    observations TEXT NOT NULL,
    rpa_flag INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS staged_woq (
    dc TEXT NOT NULL,
    order_no TEXT NOT NULL,
    kind TEXT NOT NULL,
    kind_detail TEXT NOT NULL,
    contract_no TEXT NOT NULL,
    dealer TEXT NOT NULL,
    status1 TEXT NOT NULL,
    status2 TEXT NOT NULL,
    closed_marker TEXT NOT NULL,
    system_date TEXT NOT NULL,
    client_name TEXT NOT NULL,
    region TEXT NOT NULL,
    install_amount TEXT NOT NULL,
    amount_2 TEXT NOT NULL,
    amount_3 TEXT NOT NULL,
    amount_4 TEXT NOT NULL,
    created_by TEXT NOT NULL,
    invoice_date TEXT NOT NULL,
    total_price TEXT NOT NULL,
    billing_flag TEXT NOT NULL,
    closed_marker_alt TEXT NOT NULL,
    metric_code TEXT NOT NULL,
    installation TEXT NOT NULL,
    contract_line TEXT NOT NULL,
    roster_closed TEXT NOT NULL,
    contract_ordinal INTEGER NOT NULL,
    is_closed INTEGER NOT NULL,
    outcome_state TEXT NOT NULL DEFAULT '',
    rpa_eligible TEXT NOT NULL DEFAULT ''
);
"#;

const INSERT_VALIDATED: &str = "\
INSERT INTO staged_renewal_results (
    order_no, maintenance_no, line_date, client_no, reference, kind, price,
    quantity, fee, technician, payment, qty_deinstall, qty_install, qty_total,
    outcome, observations, rpa_flag
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)";

const SELECT_VALIDATED: &str = "\
SELECT order_no, maintenance_no, line_date, client_no, reference, kind, price,
       quantity, fee, technician, payment, qty_deinstall, qty_install,
       qty_total, outcome, observations, rpa_flag
FROM staged_renewal_results ORDER BY rowid";

const INSERT_WOQ: &str = "\
INSERT INTO staged_woq (
    dc, order_no, kind, kind_detail, contract_no, dealer, status1, status2,
    closed_marker, system_date, client_name, region, install_amount, amount_2,
    amount_3, amount_4, created_by, invoice_date, total_price, billing_flag,
    closed_marker_alt, metric_code, installation, contract_line, roster_closed,
    contract_ordinal, is_closed
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
          ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)";

const SELECT_WOQ: &str = "\
SELECT dc, order_no, kind, kind_detail, contract_no, dealer, status1, status2,
       closed_marker, system_date, client_name, region, install_amount,
       amount_2, amount_3, amount_4, created_by, invoice_date, total_price,
       billing_flag, closed_marker_alt, metric_code, installation,
       contract_line, roster_closed, contract_ordinal, is_closed
FROM staged_woq ORDER BY rowid";

fn store_error(error: rusqlite::Error) -> StagingError {
    match error {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::InvalidColumnType(..) => StagingError::Corrupt(error.to_string()),
        other => StagingError::Unavailable(other.to_string()),
    }
}

impl SqliteStagingStore {
    pub(crate) fn open(path: &Path) -> Result<Self, StagingError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|error| {
                    StagingError::Unavailable(format!(
                        "cannot create {}: {error}",
                        parent.display()
                    ))
                })?;
            }
        }
        let conn = Connection::open(path).map_err(store_error)?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self, StagingError> {
        let conn = Connection::open_in_memory().map_err(store_error)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StagingError> {
        conn.execute_batch(SCHEMA).map_err(store_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock still guards a usable connection.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StagingStore for SqliteStagingStore {
    fn replace_validated(&self, lines: &[ValidatedLine]) -> Result<usize, StagingError> {
        let conn = self.conn();
        conn.execute("DELETE FROM staged_renewal_results", [])
            .map_err(store_error)?;
        let mut statement = conn.prepare(INSERT_VALIDATED).map_err(store_error)?;
        for validated in lines {
            let line = &validated.line;
            let outcome = &validated.outcome;
            statement
                .execute(params![
                    line.order_no,
                    line.maintenance_no,
                    line.date,
                    line.client_no,
                    line.reference,
                    line.kind.code(),
                    line.price,
                    line.quantity,
                    line.fee,
                    line.technician,
                    line.payment,
                    outcome.qty_deinstall,
                    outcome.qty_install,
                    outcome.qty_total,
                    outcome.state.label(),
                    outcome.observations,
                    outcome.rpa,
                ])
                .map_err(store_error)?;
        }
        Ok(lines.len())
    }

    fn load_validated(&self) -> Result<Vec<ValidatedLine>, StagingError> {
        use renewal_gate::pipeline::{GroupOutcome, RenewalLine};

        let conn = self.conn();
        let mut statement = conn.prepare(SELECT_VALIDATED).map_err(store_error)?;
        let rows = statement
            .query_map([], |row| {
                let kind: String = row.get(5)?;
                let kind = LineKind::from_code(&kind).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        format!("unknown line kind '{kind}'").into(),
                    )
                })?;
                let state: String = row.get(14)?;
                let state = OutcomeState::from_label(&state).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        14,
                        rusqlite::types::Type::Text,
                        format!("unknown outcome '{state}'").into(),
                    )
                })?;
                Ok(ValidatedLine {
                    line: RenewalLine {
                        order_no: row.get(0)?,
                        maintenance_no: row.get(1)?,
                        date: row.get(2)?,
                        client_no: row.get(3)?,
                        reference: row.get(4)?,
                        kind,
                        price: row.get(6)?,
                        quantity: row.get(7)?,
                        fee: row.get(8)?,
                        technician: row.get(9)?,
                        payment: row.get(10)?,
                    },
                    outcome: GroupOutcome {
                        qty_deinstall: row.get(11)?,
                        qty_install: row.get(12)?,
                        qty_total: row.get(13)?,
                        state,
                        observations: row.get(15)?,
                        rpa: row.get(16)?,
                    },
                })
            })
            .map_err(store_error)?;

        let mut lines = Vec::new();
        for row in rows {
            lines.push(row.map_err(store_error)?);
        }
        Ok(lines)
    }

    fn replace_woq(&self, records: &[WoqRecord]) -> Result<usize, StagingError> {
        let conn = self.conn();
        conn.execute("DELETE FROM staged_woq", [])
            .map_err(store_error)?;
        let mut statement = conn.prepare(INSERT_WOQ).map_err(store_error)?;
        for record in records {
            statement
                .execute(params![
                    record.dc,
                    record.order_no,
                    record.kind,
                    record.kind_detail,
                    record.contract_no,
                    record.dealer,
                    record.status1,
                    record.status2,
                    record.closed_marker,
                    record.system_date,
                    record.client_name,
                    record.region,
                    record.install_amount,
                    record.amount_2,
                    record.amount_3,
                    record.amount_4,
                    record.created_by,
                    record.invoice_date,
                    record.total_price,
                    record.billing_flag,
                    record.closed_marker_alt,
                    record.metric_code,
                    record.installation,
                    record.contract_line,
                    record.roster_closed,
                    record.contract_ordinal,
                    record.is_closed,
                ])
                .map_err(store_error)?;
        }
        Ok(records.len())
    }

    fn load_woq(&self) -> Result<Vec<WoqRecord>, StagingError> {
        let conn = self.conn();
        let mut statement = conn.prepare(SELECT_WOQ).map_err(store_error)?;
        let rows = statement
            .query_map([], |row| {
                Ok(WoqRecord {
                    dc: row.get(0)?,
                    order_no: row.get(1)?,
                    kind: row.get(2)?,
                    kind_detail: row.get(3)?,
                    contract_no: row.get(4)?,
                    dealer: row.get(5)?,
                    status1: row.get(6)?,
                    status2: row.get(7)?,
                    closed_marker: row.get(8)?,
                    system_date: row.get(9)?,
                    client_name: row.get(10)?,
                    region: row.get(11)?,
                    install_amount: row.get(12)?,
                    amount_2: row.get(13)?,
                    amount_3: row.get(14)?,
                    amount_4: row.get(15)?,
                    created_by: row.get(16)?,
                    invoice_date: row.get(17)?,
                    total_price: row.get(18)?,
                    billing_flag: row.get(19)?,
                    closed_marker_alt: row.get(20)?,
                    metric_code: row.get(21)?,
                    installation: row.get(22)?,
                    contract_line: row.get(23)?,
                    roster_closed: row.get(24)?,
                    contract_ordinal: row.get(25)?,
                    is_closed: row.get(26)?,
                })
            })
            .map_err(store_error)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(store_error)?);
        }
        Ok(records)
    }

    fn truncate_all(&self) -> Result<(), StagingError> {
        let conn = self.conn();
        conn.execute("DELETE FROM staged_renewal_results", [])
            .map_err(store_error)?;
        conn.execute("DELETE FROM staged_woq", [])
            .map_err(store_error)?;
        Ok(())
    }
}

pub(crate) fn build_controller(
    config: &AppConfig,
) -> Result<Arc<PipelineController<SqliteStagingStore>>, AppError> {
    let staging =
        SqliteStagingStore::open(&config.pipeline.staging_path).map_err(PipelineError::from)?;
    Ok(Arc::new(PipelineController::new(
        Arc::new(staging),
        RuleBook::default(),
        config.pipeline.export_dir.clone(),
    )))
}
