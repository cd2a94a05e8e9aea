use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn relay_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_faq-relay"))
}

fn setup_test_env(corpus: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::write(root.join("data.txt"), corpus).unwrap();

    let config_content = format!(
        r#"[corpus]
path = "{}/data.txt"
chunk_size = 1200
chunk_overlap = 50

[discord]
target_channel_id = 1411802805995569162
"#,
        root.display()
    );

    let config_path = root.join("relay.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_relay(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = relay_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("BOT_TOKEN")
        .env_remove("DISCORD_TOKEN")
        .env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "error")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run faq-relay binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_passages_lists_split_corpus() {
    let (_tmp, config) = setup_test_env("Rule: no spam\n---\nRule: be kind\n");
    let (stdout, stderr, ok) = run_relay(&config, &["passages"]);
    assert!(ok, "passages failed: {}", stderr);
    assert!(stdout.contains("Rule: no spam"));
    assert!(stdout.contains("Rule: be kind"));
    assert!(stdout.contains("2 passages"));
}

#[test]
fn test_passages_json_is_stable() {
    let (_tmp, config) = setup_test_env("Alpha\n---\nBeta\n---\nGamma");
    let (first, _, ok1) = run_relay(&config, &["passages", "--json"]);
    let (second, _, ok2) = run_relay(&config, &["passages", "--json"]);
    assert!(ok1 && ok2);
    assert_eq!(first, second);

    let parsed: serde_json::Value = serde_json::from_str(&first).unwrap();
    let passages = parsed.as_array().unwrap();
    assert_eq!(passages.len(), 3);
    assert_eq!(passages[0]["content"], "Alpha");
    assert_eq!(passages[1]["source_offset"], 10);
}

#[test]
fn test_run_without_token_fails() {
    let (_tmp, config) = setup_test_env("Rule: be kind");
    let (_, stderr, ok) = run_relay(&config, &["run"]);
    assert!(!ok);
    assert!(stderr.contains("BOT_TOKEN"), "stderr: {}", stderr);
}

#[test]
fn test_missing_corpus_fails() {
    let (tmp, config) = setup_test_env("Rule: be kind");
    fs::remove_file(tmp.path().join("data.txt")).unwrap();
    let (_, stderr, ok) = run_relay(&config, &["passages"]);
    assert!(!ok);
    assert!(stderr.contains("corpus unavailable"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("relay.toml");
    fs::write(&config, "[discord]\ntarget_channel_id = 0\n").unwrap();
    let (_, stderr, ok) = run_relay(&config, &["passages"]);
    assert!(!ok);
    assert!(stderr.contains("target_channel_id"), "stderr: {}", stderr);
}
