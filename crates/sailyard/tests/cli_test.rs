#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// 設定ファイルや環境変数の影響を受けないコマンドを作る
fn sailyard(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sailyard").unwrap();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("SAILYARD_CONFIG_PATH")
        .env_remove("SAILYARD_ENDPOINT")
        .env_remove("SAILYARD_REGION")
        .env_remove("SAILYARD_API_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("sailyard").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("クラウドリソースの調停エンジン"))
        .stdout(predicate::str::contains("tick"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("pending"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("sailyard").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sailyard"));
}

/// tickコマンドのヘルプに引数が表示されることを確認
#[test]
fn test_tick_help() {
    let mut cmd = Command::cargo_bin("sailyard").unwrap();
    cmd.arg("tick")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<KIND>"))
        .stdout(predicate::str::contains("<OPERATION>"))
        .stdout(predicate::str::contains("--model"));
}

/// runコマンドのヘルプを確認
#[test]
fn test_run_help() {
    let mut cmd = Command::cargo_bin("sailyard").unwrap();
    cmd.arg("run")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-ticks"));
}

/// 未知のリソース種別はエラーになる
#[test]
fn test_unknown_resource_kind() {
    let temp_dir = tempfile::tempdir().unwrap();
    sailyard(temp_dir.path())
        .args(["tick", "vpc", "create", "--model", "model.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vpc"));
}

/// 未知の操作はエラーになる
#[test]
fn test_unknown_operation() {
    let temp_dir = tempfile::tempdir().unwrap();
    sailyard(temp_dir.path())
        .args(["tick", "disk", "resize", "--model", "model.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("resize"));
}

/// 進行中の操作がない場合
#[test]
fn test_pending_empty() {
    let temp_dir = tempfile::tempdir().unwrap();
    sailyard(temp_dir.path())
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("進行中の操作はありません"));
}

/// エンドポイント未設定ならティックは実行されない
#[test]
fn test_tick_without_endpoint() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("disk.json"), r#"{ "diskName": "data" }"#).unwrap();

    sailyard(temp_dir.path())
        .args(["tick", "disk", "create", "--model", "disk.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SAILYARD_ENDPOINT"));
}

/// 識別子のないモデルはエラー
#[test]
fn test_tick_model_without_identifier() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("disk.json"), r#"{ "sizeInGb": 8 }"#).unwrap();

    sailyard(temp_dir.path())
        .env("SAILYARD_ENDPOINT", "http://127.0.0.1:9")
        .args(["tick", "disk", "create", "--model", "disk.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("diskName"));
}

/// 接続できないコントロールプレーンへのティックは FAILED を出力して終了コード 1
#[test]
fn test_tick_unreachable_control_plane_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("disk.json"), r#"{ "diskName": "data" }"#).unwrap();

    sailyard(temp_dir.path())
        .env("SAILYARD_ENDPOINT", "http://127.0.0.1:9")
        .args(["tick", "disk", "create", "--model", "disk.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"status\": \"FAILED\""))
        .stdout(predicate::str::contains("\"errorCode\": \"Unclassified\""));

    // 終端状態なのでコンテキストは残らない
    sailyard(temp_dir.path())
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("進行中の操作はありません"));
}

/// list は識別子なしで実行され、進行中の操作も残さない
#[test]
fn test_list_runs_without_identifier() {
    let temp_dir = tempfile::tempdir().unwrap();

    sailyard(temp_dir.path())
        .env("SAILYARD_ENDPOINT", "http://127.0.0.1:9")
        .args(["tick", "disk", "list", "--model", "-"])
        .write_stdin("{}")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"status\": \"FAILED\""))
        .stderr(predicate::str::contains("diskName").not());

    assert!(!temp_dir.path().join(".sailyard").exists());
}

/// 設定ファイルからエンドポイントを読む
#[test]
fn test_tick_reads_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("sailyard.yaml"),
        "endpoint: http://127.0.0.1:9\nstabilization:\n  max_attempts: 3\n",
    )
    .unwrap();

    sailyard(temp_dir.path())
        .args(["tick", "static-ip", "read", "--model", "-"])
        .write_stdin(r#"{ "staticIpName": "front-ip" }"#)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"));
}
