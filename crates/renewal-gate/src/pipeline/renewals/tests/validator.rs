use std::io::Cursor;

use super::common::book;
use crate::pipeline::renewals::{OutcomeState, RenewalValidator};
use crate::pipeline::PipelineError;

const HEADERS: &str = "WO,MANT,FECHA,CLIENTE,REFERENCIA,TIPO,PRECIO,CANTIDAD,CUOTA,TECNICO,PAGO";

fn validator() -> RenewalValidator {
    RenewalValidator::new(book())
}

#[test]
fn groups_are_keyed_by_client_and_maintenance() {
    let csv = format!(
        "{HEADERS}\n\
         WO-1,M-1,2025-06-01,C-1,BF039,DMCE,10,-1,,T1,CARD\n\
         WO-1,M-1,2025-06-01,C-1,BF145,AMCE,10,1,,T1,CARD\n\
         WO-2,M-2,2025-06-02,C-1,BF039,DMCE,10,-1,,T1,CARD\n\
         WO-2,M-2,2025-06-02,C-1,BF145,AMCE,10,2,,T1,CARD\n"
    );
    let run = validator()
        .validate_reader(Cursor::new(csv))
        .expect("feed validates");

    assert_eq!(run.stats.groups, 2);
    assert_eq!(run.stats.total_lines, 4);
    assert_eq!(run.stats.correct_lines, 2);
    assert_eq!(run.stats.incorrect_lines, 2);

    let first: Vec<_> = run
        .lines
        .iter()
        .filter(|l| l.line.maintenance_no == "M-1")
        .collect();
    assert!(first
        .iter()
        .all(|l| l.outcome.state == OutcomeState::Correct));

    let second: Vec<_> = run
        .lines
        .iter()
        .filter(|l| l.line.maintenance_no == "M-2")
        .collect();
    assert!(second
        .iter()
        .all(|l| l.outcome.state == OutcomeState::Warning));
}

#[test]
fn every_line_of_a_group_carries_the_same_outcome() {
    let csv = format!(
        "{HEADERS}\n\
         WO-1,M-1,2025-06-01,C-1,ZDES,DMCE,10,-1,,T1,CARD\n\
         WO-1,M-1,2025-06-01,C-1,BF145,AMCE,10,1,,T1,CARD\n"
    );
    let run = validator()
        .validate_reader(Cursor::new(csv))
        .expect("feed validates");

    assert_eq!(run.lines.len(), 2);
    assert_eq!(run.lines[0].outcome, run.lines[1].outcome);
}

#[test]
fn cleaning_drops_unjudgeable_rows() {
    let csv = format!(
        "{HEADERS}\n\
         WO-1,M-1,2025-06-01,C-1,BF039,DMCE,10,-1,,T1,CARD\n\
         WO-1,M-1,2025-06-01,C-1,BF145,AMCE,10,1,,T1,CARD\n\
         WO-9,M-9,2025-06-01,C-9,BF145,OTRO,10,1,,T1,CARD\n\
         WO-9,M-9,2025-06-01,,BF145,AMCE,10,1,,T1,CARD\n\
         WO-9,M-9,2025-06-01,C-9,BF145,AMCE,10,n/a,,T1,CARD\n"
    );
    let run = validator()
        .validate_reader(Cursor::new(csv))
        .expect("feed validates");
    assert_eq!(run.stats.total_lines, 2);
    assert_eq!(run.stats.groups, 1);
}

#[test]
fn missing_columns_are_a_schema_error() {
    let csv = "WO,MANT,FECHA,CLIENTE,REFERENCIA,TIPO\nWO-1,M-1,2025-06-01,C-1,BF039,DMCE\n";
    let error = validator()
        .validate_reader(Cursor::new(csv))
        .expect_err("schema must be rejected");
    match error {
        PipelineError::Schema(message) => {
            assert!(message.contains("CANTIDAD"));
            assert!(message.contains("PAGO"));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn nothing_left_after_cleaning_is_empty_result() {
    let csv = format!("{HEADERS}\nWO-1,M-1,2025-06-01,C-1,BF039,OTRO,10,1,,T1,CARD\n");
    let error = validator()
        .validate_reader(Cursor::new(csv))
        .expect_err("nothing judgeable");
    assert!(matches!(error, PipelineError::EmptyResult(_)));
}

#[test]
fn missing_file_is_a_source_read_error() {
    let error = validator()
        .validate_path("./no-such-renewal-feed.csv")
        .expect_err("missing file");
    assert!(matches!(error, PipelineError::SourceRead { .. }));
}
