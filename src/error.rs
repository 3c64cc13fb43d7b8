//! カタログの読み込み・検索・サンプリングのエラー型

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// 必須フィールドが無い、または型が違う
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// 同じ token id が2回出現した
    #[error("duplicate token id: {0}")]
    DuplicateToken(String),

    #[error("token not found: {0}")]
    NotFound(String),

    /// 対象レコードが要求数に足りない
    #[error("insufficient data: requested {requested}, only {available} eligible")]
    InsufficientData { requested: usize, available: usize },

    #[error("invalid board size {rows}x{cols}: need at least one pair of cards")]
    InvalidBoard { rows: usize, cols: usize },

    /// 文書が想定した外形の JSON ではない
    #[error("invalid source document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
