//! End-to-end tests of the command line with local sources.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn j2rt() -> Command {
    Command::cargo_bin("j2rt").unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn cli_renders_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "hello.j2", "Hello {{ name }}!\n");
    let vars = write(temp.path(), "vars.json", r#"{"name": "World"}"#);

    j2rt()
        .arg("-t")
        .arg(&template)
        .arg("-v")
        .arg(&vars)
        .assert()
        .success()
        .stdout("Hello World!\n");
    Ok(())
}

#[test]
fn cli_assignments_override_files() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "color.j2", "{{ color }}/{{ size }}");
    let first = write(temp.path(), "first.json", r#"{"color": "red", "size": 1}"#);
    let second = write(temp.path(), "second.json", r#"{"size": 2}"#);

    j2rt()
        .arg("-t")
        .arg(&template)
        .arg("-V")
        .arg("color=blue")
        .arg("-v")
        .arg(&first)
        .arg(&second)
        .assert()
        .success()
        .stdout("blue/2");
    Ok(())
}

#[test]
fn cli_reads_indirect_values() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "t.j2", "{{ greeting }} {{ handle }} {{ greeting | b64encode }}");
    let message = write(temp.path(), "msg.txt", "hi");

    j2rt()
        .arg("-t")
        .arg(&template)
        .arg("-V")
        .arg(format!("greeting=@{}", message.display()))
        .arg("-V")
        .arg("handle=@@someone")
        .assert()
        .success()
        .stdout("hi @someone aGk=");
    Ok(())
}

#[test]
fn cli_writes_output_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "t.j2", "value={{ value }}\n");
    let output = temp.path().join("out.txt");

    j2rt()
        .arg("-t")
        .arg(&template)
        .arg("-V")
        .arg("value=42")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(&output)?, "value=42\n");
    Ok(())
}

#[test]
fn cli_undefined_variable_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "t.j2", "{{ known }} {{ unknown }}");
    let output = temp.path().join("out.txt");

    j2rt()
        .arg("-t")
        .arg(&template)
        .arg("-V")
        .arg("known=1")
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn cli_rejects_assignment_without_separator() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "t.j2", "{{ a }}");

    j2rt()
        .arg("-t")
        .arg(&template)
        .arg("-V")
        .arg("not-an-assignment")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-an-assignment"));
    Ok(())
}

#[test]
fn cli_missing_template() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let missing = temp.path().join("missing.j2");

    j2rt()
        .arg("-t")
        .arg(&missing)
        .arg("-V")
        .arg("a=1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source not found"));
    Ok(())
}

#[test]
fn cli_no_args_prints_help() {
    j2rt()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn cli_requires_variables() {
    j2rt().args(["-t", "t.j2"]).assert().failure();
}

#[test]
fn cli_extra_arguments_after_separator() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let template = write(temp.path(), "t.j2", "{{ a }}");

    j2rt()
        .arg("-t")
        .arg(&template)
        .args(["-V", "a=1", "stray"])
        .assert()
        .failure();

    j2rt()
        .arg("-t")
        .arg(&template)
        .args(["-V", "a=1", "--", "stray"])
        .assert()
        .success()
        .stdout("1");
    Ok(())
}

#[test]
fn cli_shows_version() {
    j2rt()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
