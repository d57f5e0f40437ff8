#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Run the CLI binary against `api_url`, keeping all state in `data_dir`.
pub fn run_cli(args: &[&str], data_dir: &Path, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_backoffice"));
    cmd.args(args);
    cmd.env("BACKOFFICE_DATA_DIR", data_dir);
    cmd.env("BACKOFFICE_API_URL", api_url);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("BACKOFFICE_PASSWORD");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(args: &[&str], data_dir: &Path, api_url: &str) -> String {
    let output = run_cli(args, data_dir, api_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI off the async runtime so a mock server can answer it.
pub async fn run_cli_async(args: &[&str], data_dir: &Path, api_url: &str) -> Output {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let data_dir: PathBuf = data_dir.to_path_buf();
    let api_url = api_url.to_string();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_cli(&args, &data_dir, &api_url)
    })
    .await
    .expect("CLI task panicked")
}

/// Write the storage file directly, as a previous run would have.
pub fn seed_storage(data_dir: &Path, entries: serde_json::Value) {
    std::fs::create_dir_all(data_dir).unwrap();
    std::fs::write(
        data_dir.join("storage.json"),
        serde_json::to_string_pretty(&entries).unwrap(),
    )
    .unwrap();
}

/// Read the storage file back.
pub fn read_storage(data_dir: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(data_dir.join("storage.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
