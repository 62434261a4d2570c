use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn stargazer_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("stargazer");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"app_env = "production"

[database]
dsn = "sqlite:{}/data/stargazer.sqlite"

[server]
host = "127.0.0.1"
port = 0

[report]
window_hours = 24
limit = 10
"#,
        root.display()
    );

    let config_path = config_dir.join("stargazer.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_stargazer(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    // Run inside the test's temp dir so a developer's .env is never picked up.
    let cwd = config_path.parent().unwrap();
    run_stargazer_in(cwd, config_path, args)
}

fn run_stargazer_in(cwd: &Path, config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = stargazer_binary();
    let output = Command::new(&binary)
        .current_dir(cwd)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        // Keep the developer's environment from redirecting the test database.
        .env_remove("APP_ENV")
        .env_remove("DATABASE__DSN")
        .env_remove("DATABASE_URL")
        .env_remove("PORT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run stargazer binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_stargazer(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/stargazer.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_stargazer(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_stargazer(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_dotenv_overrides_config_file() {
    let (tmp, config_path) = setup_test_env();
    let from_env = tmp.path().join("dotenv/stargazer.sqlite");
    fs::write(
        tmp.path().join(".env"),
        format!("DATABASE_URL=sqlite:{}\n", from_env.display()),
    )
    .unwrap();

    let (stdout, stderr, success) = run_stargazer_in(tmp.path(), &config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(from_env.exists());
    assert!(!tmp.path().join("data/stargazer.sqlite").exists());
}

#[test]
fn test_report_on_empty_database() {
    let (_tmp, config_path) = setup_test_env();

    run_stargazer(&config_path, &["init"]);
    let (stdout, stderr, success) = run_stargazer(&config_path, &["report"]);
    assert!(success, "report failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No WatchEvent events in the last 24 hours"));
}

#[test]
fn test_report_rejects_zero_limit() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_stargazer(&config_path, &["report", "--limit", "0"]);
    assert!(!success);
    assert!(stderr.contains("--limit"));
}

#[test]
fn test_report_rejects_oversized_limit() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) =
        run_stargazer(&config_path, &["report", "--limit", "9223372036854775807"]);
    assert!(!success);
    assert!(stderr.contains("--limit must be in [1, 1000]"), "stderr={}", stderr);
}

#[test]
fn test_oversized_window_in_config_fails() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[report]\nwindow_hours = 9223372036854775807\n").unwrap();

    let (_, stderr, success) = run_stargazer(&bad, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("window_hours"), "stderr={}", stderr);
}

#[test]
fn test_stats_on_empty_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_stargazer(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Events:        0"));
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[ingest]\npage_size = 0\n").unwrap();

    let (_, stderr, success) = run_stargazer(&bad, &["init"]);
    assert!(!success);
    assert!(stderr.contains("page_size"));
}
