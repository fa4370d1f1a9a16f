use std::fs;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("stories.txt"),
            "The cab ride was short.\n\nA second story\nover two lines.\n",
        )
        .unwrap();
        Self { dir }
    }

    fn log(&self) -> std::path::PathBuf {
        self.dir.path().join("results.csv")
    }

    fn check(&self) -> Command {
        let mut cmd = Command::cargo_bin("authorship").unwrap();
        cmd.arg("--check")
            .arg("--config")
            .arg(self.dir.path().join("config.json"))
            .arg("--log-file")
            .arg(self.log())
            .arg("--stories")
            .arg(self.dir.path().join("stories.txt"));
        cmd
    }
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn fresh_log_starts_at_session_one() {
    let fixture = Fixture::new();
    let out = stdout_of(&mut fixture.check());
    assert!(out.contains("ok: 2 blocks"), "{out}");
    assert!(out.contains("next session 1"), "{out}");
    assert!(!fixture.log().exists(), "a check must not create the log");
}

#[test]
fn existing_log_continues_numbering() {
    let fixture = Fixture::new();
    let log = "session,block,trial,cursor_position,timestamp,response_time,target_response,response,feedback,condition\n\
               4,1,1,0,2024-01-01 10:00:00.000000,0.25,t,t,positive,control\n";
    fs::write(fixture.log(), log).unwrap();

    let out = stdout_of(&mut fixture.check());
    assert!(out.contains("next session 5"), "{out}");
    assert_eq!(fs::read_to_string(fixture.log()).unwrap(), log);
}

#[test]
fn foreign_header_is_rejected() {
    let fixture = Fixture::new();
    fs::write(fixture.log(), "id,name\n1,x\n").unwrap();
    fixture.check().assert().failure();
}

#[test]
fn impossible_rates_are_rejected() {
    let fixture = Fixture::new();
    fixture
        .check()
        .args(["--false-error-rate", "1.5"])
        .assert()
        .failure();
    fixture
        .check()
        .args(["--rectify-odds", "0.5"])
        .assert()
        .failure();
}

#[test]
fn overlong_story_is_rejected() {
    let fixture = Fixture::new();
    fs::write(fixture.dir.path().join("stories.txt"), "a".repeat(300)).unwrap();
    fixture.check().assert().failure();
}
