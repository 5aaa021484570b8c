pub mod error;

pub use error::*;

use sailyard_cloud::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sailyard の設定
///
/// ```yaml
/// endpoint: https://cp.example.com/v1
/// region: ap-northeast-1
/// stabilization:
///   max_attempts: 30
///   initial_delay_secs: 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// コントロールプレーンの URL
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub api_token: Option<String>,
    /// 安定化ポーリングの上限と待機時間
    pub stabilization: RetryConfig,
}

impl Settings {
    /// 設定ファイルを探して読み込み、環境変数で上書きする
    ///
    /// 設定ファイルが無い場合はデフォルト値を使う
    pub fn load() -> Result<Self> {
        let mut settings = match find_config_file()? {
            Some(path) => {
                tracing::debug!("設定ファイルを読み込み: {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// SAILYARD_ENDPOINT / SAILYARD_REGION / SAILYARD_API_TOKEN で上書き
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var("SAILYARD_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Ok(region) = std::env::var("SAILYARD_REGION") {
            self.region = Some(region);
        }
        if let Ok(token) = std::env::var("SAILYARD_API_TOKEN") {
            self.api_token = Some(token);
        }
    }

    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)
    }
}

/// Sailyard の設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("sailyard");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 SAILYARD_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: sailyard.yaml, .sailyard.yaml
/// 3. ./.sailyard/sailyard.yaml
/// 4. ~/.config/sailyard/config.yaml (グローバル設定)
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("SAILYARD_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigPathNotFound(path));
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    for filename in ["sailyard.yaml", ".sailyard.yaml"] {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. ./.sailyard/ ディレクトリ
    let local = current_dir.join(".sailyard").join("sailyard.yaml");
    if local.exists() {
        return Ok(Some(local));
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("sailyard").join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}
