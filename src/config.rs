use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::catalog::CatalogSource;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("設定ファイルの読み込みに失敗しました: {path}"))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).context("設定ファイルの YAML が不正です")?;
        Ok(config)
    }

    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::from_path(&self.source.path)
    }

    pub fn log_level(&self) -> &str {
        self.log
            .as_ref()
            .map(|l| l.level.as_str())
            .unwrap_or("info")
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub board: BoardConfig,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    /// JSON ページファイル、またはそのディレクトリ
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { rows: 4, cols: 4 }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
}
