// Drives the compiled binary through a PTY: the participant leaves on the
// landing page, so the log must hold the header and nothing else.
//
// Requires a TTY (expectrl allocates one). Ignored by default; run with
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};
use tempfile::tempdir;

#[test]
#[ignore]
fn escape_on_landing_page_leaves_only_header() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let log = dir.path().join("results.csv");
    let config = dir.path().join("config.json");

    let bin = assert_cmd::cargo::cargo_bin("authorship");
    let cmd = format!(
        "{} --debug --config {} --log-file {}",
        bin.display(),
        config.display(),
        log.display()
    );
    let mut p = spawn(cmd)?;

    std::thread::sleep(Duration::from_millis(300));
    p.send("\x1b")?;
    p.expect(Eof)?;

    let contents = std::fs::read_to_string(&log)?;
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.starts_with("session,block,trial"));
    Ok(())
}
