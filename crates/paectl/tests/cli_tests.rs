//! CLI integration tests for paectl
//!
//! Each test writes its own config (question service off, progress in a
//! temp dir) so the user's real files are never touched.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn setup() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[question_service]\nenabled = false\n\n[storage]\ndata_dir = {:?}\n",
            dir.path().join("data").display().to_string()
        ),
    )
    .unwrap();
    (dir, config)
}

fn paectl(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_paectl"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("PAE_DATA_DIR")
        .env_remove("PAE_QUESTION_ENDPOINT")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn proteins_lists_builtin_catalog() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["proteins"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Hemoglobin"));
    assert!(text.contains("Antibody") || text.contains("IgG"));
}

#[test]
fn show_lists_literature() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["show", "p2"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[LITERATURE]"));
    assert!(text.contains("https://pubmed.ncbi.nlm.nih.gov/3528824/"));
}

#[test]
fn show_unknown_protein_fails() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["show", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown protein"));
}

#[test]
fn grid_renders_requested_size() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["grid", "--protein", "p2", "--size", "5"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Insulin"));
    assert!(text.contains("5x5"));
    assert!(text.contains("13 cells"));
}

#[test]
fn grid_size_zero_fails() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["grid", "--size", "0"]);
    assert!(!output.status.success());
}

#[test]
fn grid_size_above_cap_fails() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["grid", "--size", "200"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Grid size must be between 1 and 64"));

    let at_cap = paectl(&config, &["grid", "--size", "64"]);
    assert!(at_cap.status.success());
    assert!(stdout(&at_cap).contains("64x64"));
}

#[test]
fn fresh_progress_is_level_one() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["progress"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Level 1"));
}

#[test]
fn achievements_start_locked() {
    let (_dir, config) = setup();
    let output = paectl(&config, &["achievements"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("(0/8)"));
}

#[test]
fn reset_requires_confirmation() {
    let (dir, config) = setup();
    let refused = paectl(&config, &["reset"]);
    assert!(!refused.status.success());

    let confirmed = paectl(&config, &["reset", "--yes"]);
    assert!(confirmed.status.success());
    assert!(dir.path().join("data").join("protein_game_progress.json").exists());
}
