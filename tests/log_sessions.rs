use std::fs;

use authorship::engine::TrialEngine;
use authorship::experiment::{Experiment, RunOutcome, Timing};
use authorship::input::ScriptedKeys;
use authorship::keys::{Alphabet, Key};
use authorship::log::LogWriter;
use authorship::policy::DeceptionPolicy;
use authorship::record::{Column, Schema};
use authorship::text::TargetText;
use authorship::ExperimentError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

fn run_session(path: &std::path::Path, schema: Schema, typed: &str, stories: &[&str]) -> (u32, RunOutcome) {
    let (log, session) = LogWriter::open(path, schema).unwrap();
    let engine = TrialEngine::new(
        session.id,
        DeceptionPolicy::new(0.2, 0.2).unwrap(),
        StdRng::seed_from_u64(session.id as u64),
    );
    let texts = stories
        .iter()
        .map(|s| TargetText::normalize(s, &Alphabet::default()))
        .collect();
    // Leading space leaves the landing page; the trailing quit ends whatever remains.
    let keys = ScriptedKeys::typing(&format!(" {typed}")).then(Key::Quit);
    let mut experiment = Experiment::new(engine, keys, log, texts, Timing::default());
    (session.id, experiment.run().unwrap())
}

#[test]
fn sessions_increment_across_runs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");

    // Typing far more than needed; sham feedback may cost extra attempts.
    let typing = "hi".repeat(40);
    let (first, _) = run_session(&path, Schema::full(), &typing, &["h"]);
    let (second, _) = run_session(&path, Schema::full(), &typing, &["h"]);
    let (third, _) = run_session(&path, Schema::full(), "", &["h"]);

    assert_eq!((first, second, third), (1, 2, 3));

    // The third run quit before typing, so the log still ends with session 2.
    let (log, next) = LogWriter::open(&path, Schema::full()).unwrap();
    assert_eq!(next.id, 3);
    let rows = log.read_rows().unwrap();
    assert!(rows.iter().any(|r| r[0] == "1"));
    assert_eq!(rows.last().unwrap()[0], "2");
}

#[test]
fn every_row_has_the_declared_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let typing = "ab ".repeat(30);
    let (_, outcome) = run_session(&path, Schema::full(), &typing, &["ab", "a b"]);
    assert!(matches!(outcome, RunOutcome::Completed { blocks: 2, .. }));

    let contents = fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next().unwrap(),
        "session,block,trial,cursor_position,timestamp,response_time,target_response,response,feedback,condition"
    );
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 10, "row `{line}`");
        assert!(["positive", "negative"].contains(&fields[8]));
        assert!(["control", "error inserted", "error rectified"].contains(&fields[9]));
        assert!(fields[5].parse::<f64>().is_ok());
    }
}

#[test]
fn reduced_schema_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let schema = Schema::new(vec![Column::Trial, Column::Response, Column::Feedback]).unwrap();
    let typing = "ab".repeat(30);
    run_session(&path, schema.clone(), &typing, &["ab"]);

    let (log, session) = LogWriter::open(&path, schema).unwrap();
    assert_eq!(session.id, 1);
    let rows = log.read_rows().unwrap();
    assert!(rows.len() >= 2);
    assert!(rows.iter().all(|r| r.len() == 3));
    assert_eq!(rows[0][0], "1");
}

#[test]
fn reopening_with_other_schema_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("results.csv");
    LogWriter::open(&path, Schema::full()).unwrap();
    let reduced = Schema::new(vec![Column::Session, Column::Trial]).unwrap();
    assert!(matches!(
        LogWriter::open(&path, reduced),
        Err(ExperimentError::SchemaMismatch { .. })
    ));
}

#[test]
fn unwritable_log_location_fails_at_startup() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "").unwrap();
    // A regular file where the log directory should be.
    let path = blocker.join("results.csv");
    assert!(LogWriter::open(&path, Schema::full()).is_err());
}
