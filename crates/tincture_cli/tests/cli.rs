//! End-to-end tests for the `tincture` binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SIMPLE: &str = r##"{"name": "Brand", "colors": {"primary": "#3B82F6"}}"##;

fn tincture() -> Command {
    let mut cmd = Command::cargo_bin("tincture").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("TINCTURE_FORMAT");
    cmd
}

fn write_theme(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_compile_prints_root_block() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.json", SIMPLE);

    tincture()
        .arg("compile")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(":root {\n"))
        .stdout(predicate::str::contains("  --color-primary-500: 217 91% 60%;\n"))
        .stdout(predicate::str::contains("  --spacing-md: 1rem;\n"));
}

#[test]
fn test_compile_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.json", SIMPLE);
    let out = dir.path().join("theme.css");

    tincture()
        .arg("compile")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let css = fs::read_to_string(out).unwrap();
    assert!(css.ends_with("}\n"));
    assert_eq!(css.matches("--").count(), 78);
}

#[test]
fn test_compile_json_variables() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.json", SIMPLE);

    let output = tincture()
        .args(["compile", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let vars: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(vars["--color-primary-500"], "217 91% 60%");
    assert_eq!(vars.as_object().unwrap().len(), 78);
}

#[test]
fn test_compile_rejects_invalid_theme() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(
        &dir,
        "bad.json",
        r#"{"name": "Bad", "colors": {"primary": {"500": "nope"}}}"#,
    );

    tincture()
        .arg("compile")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "colors.primary.500: Invalid color format: nope",
        ));
}

#[test]
fn test_compile_reads_stdin() {
    tincture()
        .args(["compile", "-"])
        .write_stdin(SIMPLE)
        .assert()
        .success()
        .stdout(predicate::str::contains("--color-primary-500: 217 91% 60%;"));
}

#[test]
fn test_check_reports_ok_and_warnings() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(
        &dir,
        "warn.json",
        r##"{"colors": {"primaryDark": "#1e3a8a", "ring": "#f43f5e"}}"##,
    );

    tincture()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: "))
        .stdout(predicate::str::contains("(78 tokens)"))
        .stdout(predicate::str::contains("warning: "))
        .stdout(predicate::str::contains("colors.ring"));
}

#[test]
fn test_check_reports_invalid_json() {
    tincture()
        .args(["check", "-"])
        .write_stdin("{\"name\": ")
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: Invalid JSON"));
}

#[test]
fn test_export_roundtrips_through_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.json", SIMPLE);
    let exported = dir.path().join("brand.toml");

    tincture()
        .args(["export", "--format", "toml", "-o"])
        .arg(&exported)
        .arg(&path)
        .assert()
        .success();

    let toml = fs::read_to_string(&exported).unwrap();
    assert!(toml.contains("name = \"Brand\""));

    tincture()
        .arg("check")
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: Brand (78 tokens)"))
        .stdout(predicate::str::contains("warning:").not());
}

#[test]
fn test_export_format_from_env() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.json", SIMPLE);

    tincture()
        .env("TINCTURE_FORMAT", "yaml")
        .arg("export")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: Brand"));
}

#[test]
fn test_unknown_extension_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.xml", SIMPLE);

    tincture()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot infer the format"));
}

#[test]
fn test_input_format_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_theme(&dir, "brand.txt", SIMPLE);

    tincture()
        .args(["check", "--input-format", "json"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: Brand"));
}

#[test]
fn test_scale_lists_shades() {
    tincture()
        .args(["scale", "#3B82F6"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("50: hsl(217 61% 95%)\n"))
        .stdout(predicate::str::contains("500: hsl(217 91% 60%)\n"))
        .stdout(predicate::str::contains("900: "));
}

#[test]
fn test_scale_rejects_dynamic_color() {
    tincture()
        .args(["scale", "transparent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot build a scale from 'transparent'"));
}
