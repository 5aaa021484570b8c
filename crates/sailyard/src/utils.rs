use anyhow::Context;
use colored::Colorize;
use sailyard_cloud::ProgressEvent;
use serde_json::Value;
use std::io::Read;

/// モデルの JSON を読み込む（`-` なら標準入力）
pub fn read_model(source: &str) -> anyhow::Result<Value> {
    let content = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("標準入力の読み込みに失敗しました")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("モデルファイルを読み込めません: {}", source))?
    };

    let model: Value = serde_json::from_str(&content)
        .with_context(|| format!("モデルの JSON が不正です: {}", source))?;
    if !model.is_object() {
        anyhow::bail!("モデルは JSON オブジェクトである必要があります");
    }
    Ok(model)
}

/// 終端イベントの結果を表示
pub fn print_outcome(event: &ProgressEvent<Value>) {
    match event {
        ProgressEvent::Success { models, .. } if !models.is_empty() => {
            println!("  {} {} 件", "✓".green(), models.len());
        }
        ProgressEvent::Success { .. } => {
            println!("  {} 完了", "✓".green());
        }
        ProgressEvent::Failed {
            error_code,
            message,
        } => {
            eprintln!("  {} {}: {}", "✗".red(), error_code.to_string().red(), message);
        }
        ProgressEvent::InProgress { .. } => {}
    }
}
