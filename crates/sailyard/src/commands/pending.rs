use colored::Colorize;
use sailyard_cloud::ContextStore;

pub async fn handle(store: &ContextStore) -> anyhow::Result<()> {
    let pending = store.load().await?;

    if let Some(holder) = store.lock_holder().await? {
        println!(
            "{} {} ({}) を pid {} ({}) がティック中",
            "🔒".yellow(),
            holder.key.cyan(),
            holder.operation,
            holder.pid,
            holder.host
        );
    }

    if pending.is_empty() {
        println!("{}", "進行中の操作はありません".dimmed());
        return Ok(());
    }

    println!("{}", "進行中の操作:".bold());
    for (key, operation) in pending.iter() {
        println!(
            "  • {} {} (試行 {} 回, 開始 {})",
            key.cyan(),
            operation.operation,
            operation.context.stabilization_attempts,
            operation.started_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
