pub mod pending;
pub mod run;
pub mod tick;

use anyhow::Context;
use sailyard_cloud::{ContextStore, RetryConfig};
use sailyard_config::Settings;
use sailyard_resources::{ControlPlane, ControlPlaneConfig, HttpControlPlane};
use std::sync::Arc;

/// ティック実行に必要なものをまとめたもの
pub struct Driver {
    pub client: Arc<dyn ControlPlane>,
    pub retry: RetryConfig,
    pub store: ContextStore,
}

impl Driver {
    /// 設定を読み込み、HTTP クライアントを組み立てる
    pub fn load(store: ContextStore) -> anyhow::Result<Self> {
        let settings = Settings::load().context("設定の読み込みに失敗しました")?;
        let endpoint = settings.endpoint()?;

        let mut config = ControlPlaneConfig::new(endpoint);
        if let Some(region) = &settings.region {
            config = config.with_region(region.clone());
        }
        if let Some(token) = &settings.api_token {
            config = config.with_api_token(token.clone());
        }
        tracing::debug!("control plane: {}", config.endpoint);

        Ok(Self {
            client: Arc::new(HttpControlPlane::new(config)),
            retry: settings.stabilization,
            store,
        })
    }
}
