//! 読み取り専用のコレクティブル・カタログ
//!
//! [`Catalog::load`] で一度だけ構築し、以降は変更しない。
//! ロックなしでスレッド間共有できる。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{CatalogError, Result};
use crate::metadata::{ContractInfo, NftDocument, NftEntry};
use crate::record::CollectibleRecord;

/// フィクスチャデータの読み込み元
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// メモリ上の JSON 文字列
    Json(String),
    /// JSON ページファイル1つ
    File(PathBuf),
    /// `*.json` ページを含むディレクトリ（パス順に結合）
    Directory(PathBuf),
}

impl CatalogSource {
    /// `path` の実体に応じて `File` / `Directory` を選ぶ
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            CatalogSource::Directory(path)
        } else {
            CatalogSource::File(path)
        }
    }
}

/// パース済みページ（エントリは未検証）
struct Page {
    entries: Vec<Value>,
    page_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<CollectibleRecord>,
    index: HashMap<String, usize>,
    collection: Option<ContractInfo>,
    next_page_key: Option<String>,
}

impl Catalog {
    /// `source` の全レコードをパース・検証する
    ///
    /// 不正・重複レコードがあれば即エラー。部分的なカタログは返さない。
    /// エラー中のインデックスは全ページ通しの位置。
    pub fn load(source: &CatalogSource) -> Result<Self> {
        let pages = match source {
            CatalogSource::Json(text) => vec![parse_page(text)?],
            CatalogSource::File(path) => vec![read_page(path)?],
            CatalogSource::Directory(dir) => read_pages(dir)?,
        };

        let page_count = pages.len();
        let catalog = Self::from_pages(pages)?;

        let without_image = catalog.records.iter().filter(|r| !r.image_available()).count();
        info!(
            records = catalog.records.len(),
            pages = page_count,
            without_image,
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn from_pages(pages: Vec<Page>) -> Result<Self> {
        let mut records = Vec::new();
        let mut index = HashMap::new();
        let mut collection = None;
        let mut next_page_key = None;

        let mut position = 0usize;
        for page in pages {
            for value in page.entries {
                let mut entry = NftEntry::parse(position, value)?;
                if collection.is_none() {
                    collection = entry.contract.take();
                }
                let record = entry.into_record(position)?;

                if index.contains_key(&record.token_id) {
                    return Err(CatalogError::DuplicateToken(record.token_id));
                }
                index.insert(record.token_id.clone(), records.len());
                records.push(record);
                position += 1;
            }
            next_page_key = page.page_key;
        }

        Ok(Self {
            records,
            index,
            collection,
            next_page_key,
        })
    }

    pub fn get(&self, token_id: &str) -> Result<&CollectibleRecord> {
        self.index
            .get(token_id)
            .map(|&i| &self.records[i])
            .ok_or_else(|| CatalogError::NotFound(token_id.to_string()))
    }

    pub fn contains(&self, token_id: &str) -> bool {
        self.index.contains_key(token_id)
    }

    /// 読み込み順の全レコード。再度呼べば先頭からやり直せる
    pub fn all(&self) -> std::slice::Iter<'_, CollectibleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 最初にコントラクト情報を持っていたエントリのもの
    pub fn collection(&self) -> Option<&ContractInfo> {
        self.collection.as_ref()
    }

    /// 最後に読んだページのページングカーソル（ここでは辿らない）
    pub fn next_page_key(&self) -> Option<&str> {
        self.next_page_key.as_deref()
    }

    /// `excluding` に含まれない ID から、重複なしで一様ランダムに `n` 件選ぶ
    pub fn sample(
        &self,
        n: usize,
        excluding: &HashSet<String>,
    ) -> Result<Vec<&CollectibleRecord>> {
        self.sample_with_rng(n, excluding, &mut thread_rng())
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        n: usize,
        excluding: &HashSet<String>,
        rng: &mut R,
    ) -> Result<Vec<&CollectibleRecord>> {
        self.sample_matching(n, rng, |r| !excluding.contains(r.token_id.as_str()))
    }

    /// [`Catalog::sample_with_rng`] の対象条件を任意の述語にしたもの
    pub fn sample_matching<R, F>(
        &self,
        n: usize,
        rng: &mut R,
        eligible: F,
    ) -> Result<Vec<&CollectibleRecord>>
    where
        R: Rng + ?Sized,
        F: Fn(&CollectibleRecord) -> bool,
    {
        let pool: Vec<&CollectibleRecord> = self.records.iter().filter(|r| eligible(r)).collect();

        if pool.len() < n {
            return Err(CatalogError::InsufficientData {
                requested: n,
                available: pool.len(),
            });
        }

        let mut chosen: Vec<&CollectibleRecord> = pool.choose_multiple(rng, n).copied().collect();
        chosen.shuffle(rng);
        Ok(chosen)
    }

    /// 画像を表示できるレコード
    pub fn with_images(&self) -> impl Iterator<Item = &CollectibleRecord> + '_ {
        self.records.iter().filter(|r| r.image_available())
    }

    /// 重複を除いた画像 URL（読み込み順）
    pub fn image_urls(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.image_url.as_deref())
            .filter(|url| seen.insert(*url))
            .collect()
    }

    /// trait 種別ごと・値ごとのレコード数
    pub fn trait_distribution(&self) -> BTreeMap<&str, BTreeMap<&str, usize>> {
        let mut stats: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        for record in &self.records {
            for t in &record.attributes {
                *stats
                    .entry(t.trait_type.as_str())
                    .or_default()
                    .entry(t.value.as_str())
                    .or_insert(0) += 1;
            }
        }
        stats
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CollectibleRecord;
    type IntoIter = std::slice::Iter<'a, CollectibleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}

fn parse_page(text: &str) -> Result<Page> {
    let document: NftDocument = serde_json::from_str(text)?;
    let (entries, page_key) = document.into_parts();
    Ok(Page { entries, page_key })
}

fn read_page(path: &Path) -> Result<Page> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let page = parse_page(&text)?;
    debug!(path = %path.display(), entries = page.entries.len(), "page parsed");
    Ok(page)
}

/// `dir` 以下の `*.json` を全て読む。並列でパースし、パス順で返す
fn read_pages(dir: &Path) -> Result<Vec<Page>> {
    if !dir.is_dir() {
        return Err(CatalogError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let files = collect_json_files(dir)?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "no JSON pages found");
    }

    files.par_iter().map(|path| read_page(path)).collect()
}

/// 読めないエントリが一つでもあればエラーにする（ページ欠けのまま読み込まない）
fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if let Some(ext) = path.extension() {
            if ext.eq_ignore_ascii_case("json") {
                files.push(path);
            }
        }
    }
    Ok(files)
}

fn walk_error(dir: &Path, err: walkdir::Error) -> CatalogError {
    let path = err.path().unwrap_or(dir).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop while walking pages"));
    CatalogError::Io { path, source }
}
