mod commands;
mod utils;

use clap::{Parser, Subcommand};
use sailyard_cloud::{ContextStore, OperationKind};
use sailyard_resources::ResourceKind;

#[derive(Parser)]
#[command(name = "sailyard")]
#[command(about = "宣言した状態へ、一歩ずつ。クラウドリソースの調停エンジン", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 1 ティックだけ実行し、ProgressEvent を JSON で出力
    Tick {
        /// リソースの種類
        kind: ResourceKind,
        /// 操作 (create, read, update, delete, list)
        operation: OperationKind,
        /// モデルの JSON ファイル（- で標準入力）
        #[arg(short, long)]
        model: String,
    },
    /// 終端状態になるまでティックを繰り返す
    Run {
        /// リソースの種類
        kind: ResourceKind,
        /// 操作 (create, read, update, delete, list)
        operation: OperationKind,
        /// モデルの JSON ファイル（- で標準入力）
        #[arg(short, long)]
        model: String,
        /// 最大ティック数（到達したら進行状況を保存して終了）
        #[arg(long)]
        max_ticks: Option<u32>,
    },
    /// 進行中の操作を一覧表示
    Pending,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout は ProgressEvent の出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let project_root = std::env::current_dir()?;
    let store = ContextStore::new(&project_root);

    let succeeded = match cli.command {
        Commands::Version => {
            println!("sailyard {}", env!("CARGO_PKG_VERSION"));
            true
        }
        Commands::Pending => {
            commands::pending::handle(&store).await?;
            true
        }
        Commands::Tick {
            kind,
            operation,
            model,
        } => {
            let driver = commands::Driver::load(store)?;
            commands::tick::handle(&driver, kind, operation, &model).await?
        }
        Commands::Run {
            kind,
            operation,
            model,
            max_ticks,
        } => {
            let driver = commands::Driver::load(store)?;
            commands::run::handle(&driver, kind, operation, &model, max_ticks).await?
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
