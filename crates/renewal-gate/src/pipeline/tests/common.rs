use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::pipeline::controller::PipelineController;
use crate::pipeline::renewals::{RuleBook, ValidatedLine};
use crate::pipeline::staging::{StagingError, StagingStore};
use crate::pipeline::woq::WoqRecord;

#[derive(Default)]
pub(super) struct MemoryStaging {
    pub(super) validated: Mutex<Vec<ValidatedLine>>,
    pub(super) woq: Mutex<Vec<WoqRecord>>,
    pub(super) fail_writes: bool,
}

impl MemoryStaging {
    pub(super) fn load_validated_len(&self) -> usize {
        self.validated.lock().expect("staging mutex poisoned").len()
    }

    pub(super) fn load_woq_len(&self) -> usize {
        self.woq.lock().expect("staging mutex poisoned").len()
    }
}

impl StagingStore for MemoryStaging {
    fn replace_validated(&self, lines: &[ValidatedLine]) -> Result<usize, StagingError> {
        if self.fail_writes {
            return Err(StagingError::Unavailable("staging offline".to_string()));
        }
        let mut slot = self.validated.lock().expect("staging mutex poisoned");
        *slot = lines.to_vec();
        Ok(slot.len())
    }

    fn load_validated(&self) -> Result<Vec<ValidatedLine>, StagingError> {
        Ok(self.validated.lock().expect("staging mutex poisoned").clone())
    }

    fn replace_woq(&self, records: &[WoqRecord]) -> Result<usize, StagingError> {
        if self.fail_writes {
            return Err(StagingError::Unavailable("staging offline".to_string()));
        }
        let mut slot = self.woq.lock().expect("staging mutex poisoned");
        *slot = records.to_vec();
        Ok(slot.len())
    }

    fn load_woq(&self) -> Result<Vec<WoqRecord>, StagingError> {
        Ok(self.woq.lock().expect("staging mutex poisoned").clone())
    }

    fn truncate_all(&self) -> Result<(), StagingError> {
        self.validated.lock().expect("staging mutex poisoned").clear();
        self.woq.lock().expect("staging mutex poisoned").clear();
        Ok(())
    }
}

pub(super) fn build_controller(
    staging: Arc<MemoryStaging>,
    export_dir: &Path,
) -> PipelineController<MemoryStaging> {
    PipelineController::new(staging, RuleBook::default(), export_dir)
}

/// One Correct group (WO-1/WO-2) and one Incorrect group (WO-3, bad sign).
pub(super) fn renewal_csv(dir: &Path) -> PathBuf {
    let path = dir.join("renewals.csv");
    let content = "\
WO,MANT,FECHA,CLIENTE,REFERENCIA,TIPO,PRECIO,CANTIDAD,CUOTA,TECNICO,PAGO
WO-1,M-1,2025-06-01,C-1,BF039,DMCE,10.0,-1,0,T1,P1
WO-2,M-1,2025-06-01,C-1,BF145,AMCE,10.0,1,0,T1,P1
WO-3,M-2,2025-06-01,C-2,BF039,DMCE,10.0,1,0,T1,P1
";
    std::fs::write(&path, content).expect("fixture written");
    path
}

/// Headerless semicolon feed with (order, contract, closed marker) triples
/// placed at their source positions.
pub(super) fn woq_csv(dir: &Path, rows: &[(&str, &str, &str)]) -> PathBuf {
    let path = dir.join("woq.csv");
    let mut content = String::new();
    for (order, contract, marker) in rows {
        let mut cells = vec![""; 45];
        cells[1] = order;
        cells[5] = contract;
        cells[10] = marker;
        content.push_str(&cells.join(";"));
        content.push('\n');
    }
    std::fs::write(&path, content).expect("fixture written");
    path
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
