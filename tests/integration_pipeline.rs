//! Integration tests for the full explore-clean-chart-export workflow.
//!
//! These drive the public API end to end the way a hosting UI would: load
//! uploaded bytes, run cleaning steps in user order, build charts, export,
//! and reload the export.

use griddle::{
    ChartData, ChartKind, ChartRequest, CleaningStep, ColumnKind, Error, ExportFormat,
    ExportRequest, Session,
};

#[test]
fn test_dedup_then_drop_missing_leaves_the_complete_row() {
    // a,b / 1,2 / 1,2 / 3,<missing>
    let mut session = Session::new();
    session.load(b"a,b\n1,2\n1,2\n3,\n", "sample.csv").unwrap();

    let report = session.apply(&CleaningStep::RemoveDuplicates).unwrap();
    assert_eq!(report.affected, 1, "one duplicate row");

    let report = session.apply(&CleaningStep::DropMissing).unwrap();
    assert_eq!(report.affected, 1, "the 3,<missing> row");

    // Keep-first dedup retains the first 1,2; only the row with the gap is
    // gone.
    assert_eq!(session.table().unwrap().height(), 1);
}

#[test]
fn test_fill_mean_replaces_the_gap_with_two() {
    let mut session = Session::new();
    session.load(b"x,tag\n1,a\n,b\n3,c\n", "gaps.csv").unwrap();

    session.apply(&CleaningStep::FillMissingWithMean).unwrap();

    let x = session
        .table()
        .unwrap()
        .column("x")
        .unwrap()
        .as_materialized_series()
        .clone();
    let filled = x.cast(&polars::prelude::DataType::Float64).unwrap();
    let values: Vec<f64> = filled.f64().unwrap().into_iter().flatten().collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_fill_constant_then_describe_shows_no_missing() {
    let mut session = Session::new();
    session
        .load(b"name,score\nada,\n,41\n", "scores.csv")
        .unwrap();

    session
        .apply(&CleaningStep::FillMissingWithConstant("0".to_owned()))
        .unwrap();

    for column in session.describe().unwrap() {
        assert_eq!(column.missing, 0, "column {}", column.name);
        assert_eq!(column.missing_pct, 0.0);
    }
}

#[test]
fn test_describe_matches_the_upload() {
    let mut session = Session::new();
    session
        .load(b"name,age\nada,36\nbob,\nlin,41\nmax,\n", "people.csv")
        .unwrap();

    let summary = session.summarize().unwrap();
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.columns, 2);

    let age = &summary.schema[1];
    assert_eq!(age.name, "age");
    assert_eq!(age.kind, ColumnKind::Number);
    assert_eq!(age.missing, 2);
    assert_eq!(age.missing_pct, 50.0);
}

#[test]
fn test_conversion_failure_keeps_the_session_table_identical() {
    let mut session = Session::new();
    session
        .load(b"code\nA1\nB2\n", "codes.csv")
        .unwrap();
    let before = session.table().unwrap().clone();

    let err = session
        .apply(&CleaningStep::ConvertColumnType {
            column: "code".to_owned(),
            target: ColumnKind::Number,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));
    assert!(before.equals_missing(session.table().unwrap()));
}

#[test]
fn test_select_columns_then_export_narrows_the_csv() {
    let mut session = Session::new();
    session
        .load(b"a,b,c\n1,2,3\n4,5,6\n", "wide.csv")
        .unwrap();

    session
        .apply(&CleaningStep::SelectColumns(vec!["c".to_owned(), "a".to_owned()]))
        .unwrap();

    let payload = session
        .export(&ExportRequest { format: ExportFormat::Csv, base: "narrow".to_owned() })
        .unwrap();
    let text = String::from_utf8(payload.bytes).unwrap();
    assert!(text.starts_with("c,a\n"));
}

#[test]
fn test_csv_round_trip_preserves_names_values_and_types() {
    let mut session = Session::new();
    session
        .load(b"city,temp\noslo,3.5\nbergen,7.25\n", "weather.csv")
        .unwrap();
    let original = session.table().unwrap().clone();

    let payload = session
        .export(&ExportRequest { format: ExportFormat::Csv, base: "weather_out".to_owned() })
        .unwrap();
    assert_eq!(payload.filename, "weather_out.csv");
    assert_eq!(payload.mime, "text/csv");

    let mut reloaded = Session::new();
    reloaded.load(&payload.bytes, &payload.filename).unwrap();
    assert!(original.equals_missing(reloaded.table().unwrap()));
}

#[test]
fn test_xlsx_round_trip_preserves_the_table() {
    let mut session = Session::new();
    session
        .load(b"city,temp\noslo,3.5\nbergen,7.25\n", "weather.csv")
        .unwrap();

    let payload = session
        .export(&ExportRequest { format: ExportFormat::Xlsx, base: "weather_out".to_owned() })
        .unwrap();
    assert_eq!(payload.filename, "weather_out.xlsx");

    let mut reloaded = Session::new();
    reloaded.load(&payload.bytes, &payload.filename).unwrap();
    let table = reloaded.table().unwrap();
    assert_eq!(table.height(), 2);

    let names: Vec<String> = table
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, vec!["city", "temp"]);
    assert!(table.column("temp").unwrap().dtype().is_primitive_numeric());
}

#[test]
fn test_unsupported_upload_is_rejected_by_name() {
    let mut session = Session::new();
    let err = session.load(b"some bytes", "notes.txt").unwrap_err();
    assert_eq!(err, Error::UnsupportedFormat("txt".to_owned()));
    assert!(session.table().is_none());
}

#[test]
fn test_bar_chart_over_cleaned_table() {
    let mut session = Session::new();
    session
        .load(
            b"region,units\nwest,10\nwest,10\neast,20\neast,40\n",
            "sales.csv",
        )
        .unwrap();
    session.apply(&CleaningStep::RemoveDuplicates).unwrap();

    let spec = session
        .chart(&ChartRequest {
            kind: ChartKind::Bar,
            x: Some("region".to_owned()),
            y: Some("units".to_owned()),
        })
        .unwrap();

    let ChartData::Bar { categories, values } = spec.data else {
        panic!("Expected bar data");
    };
    assert_eq!(categories, vec!["east", "west"]);
    assert_eq!(values, vec![30.0, 10.0]);
}

#[test]
fn test_correlation_over_upload_with_two_numeric_columns() {
    let mut session = Session::new();
    session
        .load(b"x,y\n1,2\n2,4\n3,6\n", "pairs.csv")
        .unwrap();

    let spec = session
        .chart(&ChartRequest { kind: ChartKind::CorrelationMatrix, x: None, y: None })
        .unwrap();

    let ChartData::Correlation { matrix, .. } = spec.data else {
        panic!("Expected correlation data");
    };
    assert!((matrix[0][0] - 1.0).abs() < 1e-9);
    assert!((matrix[1][1] - 1.0).abs() < 1e-9);
    // y = 2x correlates perfectly.
    assert!((matrix[0][1] - 1.0).abs() < 1e-9);
}

#[test]
fn test_chart_errors_do_not_disturb_the_session() {
    let mut session = Session::new();
    session.load(b"name\nada\nbob\n", "names.csv").unwrap();
    let before = session.table().unwrap().clone();

    let err = session
        .chart(&ChartRequest { kind: ChartKind::CorrelationMatrix, x: None, y: None })
        .unwrap_err();
    assert_eq!(err, Error::InsufficientNumericColumns);

    let err = session
        .chart(&ChartRequest {
            kind: ChartKind::Histogram,
            x: Some("name".to_owned()),
            y: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Chart(_)));

    assert!(before.equals_missing(session.table().unwrap()));
}

#[test]
fn test_every_user_action_rereads_current_state() {
    // Inspector output tracks the working table across steps, the way the
    // page recomputes everything on each interaction.
    let mut session = Session::new();
    session.load(b"a,b\n1,\n1,\n2,3\n", "steps.csv").unwrap();
    assert_eq!(session.describe().unwrap()[1].missing, 2);

    session.apply(&CleaningStep::DropMissing).unwrap();
    assert_eq!(session.describe().unwrap()[1].missing, 0);
    assert_eq!(session.summarize().unwrap().rows, 1);

    session.apply(&CleaningStep::RemoveDuplicates).unwrap();
    assert_eq!(session.summarize().unwrap().rows, 1);
}
