use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn scx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("scx");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/scripture.sqlite"

[retrieval]
n_results = 8
similarity_threshold = 0.3
relevance_threshold = 0.25

[embedding]
provider = "disabled"
"#,
        root.display()
    );

    let config_path = config_dir.join("scx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_scx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = scx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run scx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_scx(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/scripture.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_scx(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_scx(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_refs_needs_no_config() {
    let missing = PathBuf::from("/nonexistent/scx.toml");
    let (stdout, stderr, success) = run_scx(
        &missing,
        &["refs", "Compare Romans 8:28 with 요한복음 3:16 and 시편 23장 1절"],
    );
    assert!(success, "refs failed: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Romans 8:28  /  로마서 8:28",
            "John 3:16  /  요한복음 3:16",
            "Psalms 23:1  /  시편 23:1",
        ]
    );
}

#[test]
fn test_refs_drops_unknown_books() {
    let missing = PathBuf::from("/nonexistent/scx.toml");
    let (stdout, _, success) = run_scx(&missing, &["refs", "What does Hezekiah 4:12 say?"]);
    assert!(success);
    assert!(stdout.contains("No references found."));
}

#[test]
fn test_stats_on_empty_index() {
    let (_tmp, config_path) = setup_test_env();

    run_scx(&config_path, &["init"]);
    let (stdout, stderr, success) = run_scx(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Verses:      0"));
}

#[test]
fn test_search_requires_embedding_provider() {
    let (_tmp, config_path) = setup_test_env();

    run_scx(&config_path, &["init"]);
    let (_, stderr, success) = run_scx(&config_path, &["search", "peace in hard times"]);
    assert!(!success, "search should fail with embeddings disabled");
    assert!(stderr.contains("disabled"), "stderr={}", stderr);
}

#[test]
fn test_chapter_not_found() {
    let (_tmp, config_path) = setup_test_env();

    run_scx(&config_path, &["init"]);
    let (_, stderr, success) = run_scx(&config_path, &["chapter", "John", "3"]);
    assert!(!success);
    assert!(stderr.contains("Chapter not found"));
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        format!(
            "[db]\npath = \"{}/x.sqlite\"\n[overlay]\nprovider = \"nlt\"\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_scx(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Unknown overlay provider"));
}
