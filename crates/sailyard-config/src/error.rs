use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error("SAILYARD_CONFIG_PATH で指定された設定ファイルが存在しません: {}", .0.display())]
    ConfigPathNotFound(PathBuf),

    #[error(
        "コントロールプレーンのエンドポイントが設定されていません。\n\
        sailyard.yaml の endpoint か SAILYARD_ENDPOINT 環境変数で指定してください"
    )]
    MissingEndpoint,

    #[error("設定ファイルの解析に失敗しました: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
