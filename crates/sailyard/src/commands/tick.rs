use crate::commands::Driver;
use crate::utils;
use anyhow::Context;
use sailyard_cloud::{
    CallbackContext, OperationKind, PendingOperation, PendingOperations, ProgressEvent,
};
use sailyard_resources::{ResourceKind, dispatch};
use serde_json::Value;

/// 保存済みのコンテキストから 1 ティック進め、結果を保存する
///
/// read / list は 1 ティックで終わるため、ロックも保存もしない
pub async fn tick_once(
    driver: &Driver,
    kind: ResourceKind,
    op: OperationKind,
    model: Value,
) -> anyhow::Result<ProgressEvent<Value>> {
    if op == OperationKind::List {
        return Ok(one_shot(driver, kind, op, model).await);
    }

    let identifier = kind.identifier(&model).ok_or_else(|| {
        anyhow::anyhow!(
            "モデルに {} がありません ({})",
            kind.identifier_field(),
            kind
        )
    })?;
    if op == OperationKind::Read {
        return Ok(one_shot(driver, kind, op, model).await);
    }
    let key = PendingOperations::key(kind.as_str(), &identifier);

    let lock = driver
        .store
        .acquire_lock(&key, op)
        .await
        .context("状態ファイルのロックを取得できません")?;
    let mut pending = driver.store.load().await?;
    let context = pending.resume(&key, op);

    let event = dispatch::tick(
        kind,
        driver.client.clone(),
        &driver.retry,
        op,
        model,
        context,
    )
    .await;

    match event.context() {
        Some(context) if !event.is_terminal() => {
            let next = match pending.get(&key) {
                Some(existing) if existing.operation == op => existing.advance(context.clone()),
                _ => PendingOperation::new(op, context.clone()),
            };
            pending.set(key, next);
        }
        _ => {
            pending.remove(&key);
        }
    }

    driver.store.save(&pending).await?;
    lock.release().await?;
    Ok(event)
}

async fn one_shot(
    driver: &Driver,
    kind: ResourceKind,
    op: OperationKind,
    model: Value,
) -> ProgressEvent<Value> {
    dispatch::tick(
        kind,
        driver.client.clone(),
        &driver.retry,
        op,
        model,
        CallbackContext::new(),
    )
    .await
}

pub async fn handle(
    driver: &Driver,
    kind: ResourceKind,
    op: OperationKind,
    model_source: &str,
) -> anyhow::Result<bool> {
    let model = utils::read_model(model_source)?;
    let event = tick_once(driver, kind, op, model).await?;

    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(!event.is_failed())
}
