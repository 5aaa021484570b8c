use crate::commands::{Driver, tick};
use crate::utils;
use colored::Colorize;
use sailyard_cloud::OperationKind;
use sailyard_resources::ResourceKind;
use std::time::Duration;

/// スケジューラ役: 終端状態になるまでティックを繰り返す
pub async fn handle(
    driver: &Driver,
    kind: ResourceKind,
    op: OperationKind,
    model_source: &str,
    max_ticks: Option<u32>,
) -> anyhow::Result<bool> {
    let mut model = utils::read_model(model_source)?;
    let name = kind
        .identifier(&model)
        .unwrap_or_else(|| "(unnamed)".to_string());
    println!("{} {} {} を開始", kind.to_string().cyan(), name.bold(), op);

    let mut ticks = 0u32;
    loop {
        ticks += 1;
        let event = tick::tick_once(driver, kind, op, model.clone()).await?;

        if event.is_terminal() {
            utils::print_outcome(&event);
            println!("{}", serde_json::to_string_pretty(&event)?);
            return Ok(!event.is_failed());
        }

        if max_ticks.is_some_and(|max| ticks >= max) {
            println!(
                "{}",
                "最大ティック数に達しました。進行状況は保存されています".yellow()
            );
            return Ok(true);
        }

        let delay = event
            .delay_seconds()
            .unwrap_or(driver.retry.initial_delay_secs);
        let attempts = event
            .context()
            .map(|c| c.stabilization_attempts)
            .unwrap_or_default();
        println!(
            "  {} 安定化待ち (試行 {} 回目、{}秒後に再確認)",
            "…".dimmed(),
            attempts,
            delay
        );

        if let Ok((next, _)) = event.proceed() {
            model = next;
        }
        tokio::time::sleep(Duration::from_secs(delay)).await;
    }
}
