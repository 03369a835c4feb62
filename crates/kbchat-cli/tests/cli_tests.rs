//! Integration tests for the kbchat binary
//!
//! Every case here fails or finishes before any network call.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const PROVIDER_ENV: &[&str] = &[
    "AWS_REGION",
    "KNOWLEDGE_BASE_ID",
    "DATA_SOURCE_ID",
    "MODEL_ID",
    "S3_BUCKET_NAME",
    "MAX_TOKENS",
    "TEMPERATURE",
    "AWS_BEARER_TOKEN_BEDROCK",
    "KBCHAT_RUNTIME_ENDPOINT",
    "KBCHAT_AGENT_ENDPOINT",
    "KBCHAT_S3_ENDPOINT",
    "KBCHAT_TIMEOUT_SECS",
    "RUST_LOG",
];

/// Command isolated from the caller's config file and environment
fn kbchat_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kbchat").unwrap();
    cmd.env("KBCHAT_CONFIG", config_dir.path().join("config.yml"));
    for key in PROVIDER_ENV {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("mcp"));
}

#[test]
fn test_ask_empty_question_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .env("KNOWLEDGE_BASE_ID", "KB123")
        .args(["ask", "   "])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Question cannot be empty"));
}

#[test]
fn test_ask_rejects_script_content() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .env("KNOWLEDGE_BASE_ID", "KB123")
        .args(["ask", "<script>alert(1)</script>"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid content"));
}

#[test]
fn test_ask_without_knowledge_base_is_config_error() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .args(["ask", "What", "is", "X?"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Knowledge base ID is not configured"));
}

#[test]
fn test_ask_rejects_unknown_query_type() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .args(["ask", "--type", "poetry", "What is X?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown query type"));
}

#[test]
fn test_config_redacts_api_key() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .env("AWS_BEARER_TOKEN_BEDROCK", "super-secret-token")
        .env("KNOWLEDGE_BASE_ID", "KB123")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("KB123"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("super-secret-token").not());
}

#[test]
fn test_config_reads_yaml_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.yml"),
        "knowledge_base:\n  knowledge_base_id: KBFILE\n  region: eu-west-1\n",
    )
    .unwrap();

    let output = kbchat_cmd(&dir)
        .args(["--format", "json", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["knowledge_base"]["knowledge_base_id"], "KBFILE");
    assert_eq!(value["knowledge_base"]["region"], "eu-west-1");
    assert_eq!(value["knowledge_base"]["model_id"], "openai.gpt-oss-120b-1:0");
}

#[test]
fn test_config_validate_rejects_temperature() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .env("TEMPERATURE", "5")
        .args(["config", "--validate"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("TEMPERATURE must be between 0 and 2"));
}

#[test]
fn test_sync_requires_data_source() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .env("KNOWLEDGE_BASE_ID", "KB123")
        .arg("sync")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Data source ID is not configured"));
}

#[test]
fn test_health_without_knowledge_base_is_unhealthy() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .arg("health")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("unhealthy"));
}

#[test]
fn test_upload_without_bucket_fails() {
    let dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("guide.md"), "# Guide").unwrap();

    kbchat_cmd(&dir)
        .arg("upload")
        .arg(docs.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("S3 bucket is not configured"));
}

#[test]
fn test_upload_with_no_allowed_files() {
    let dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("tool.exe"), "MZ").unwrap();

    kbchat_cmd(&dir)
        .env("S3_BUCKET_NAME", "docs")
        .arg("upload")
        .arg(docs.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No uploadable files found"));
}

#[test]
fn test_chat_exits_on_quit() {
    let dir = TempDir::new().unwrap();
    kbchat_cmd(&dir)
        .env("KNOWLEDGE_BASE_ID", "KB123")
        .arg("chat")
        .write_stdin("hi\nquit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Question is too short"));
}
