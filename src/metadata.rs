//! 上流 API（NFTs for contract）レスポンスページの形

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::record::{CollectibleRecord, Trait};

/// フィクスチャ文書。レスポンスページそのものか、エントリの配列
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NftDocument {
    Page(NftPage),
    Entries(Vec<Value>),
}

impl NftDocument {
    pub fn into_parts(self) -> (Vec<Value>, Option<String>) {
        match self {
            NftDocument::Page(page) => (page.nfts, page.page_key),
            NftDocument::Entries(entries) => (entries, None),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftPage {
    pub nfts: Vec<Value>,
    #[serde(default)]
    pub page_key: Option<String>,
}

/// `nfts` の1エントリ。型エラーを位置付きで報告できるよう、
/// 検証までは生の JSON のまま持つ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftEntry {
    #[serde(default)]
    pub contract: Option<ContractInfo>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<NftImage>,
    #[serde(default)]
    pub raw: Option<RawPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub total_supply: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftImage {
    #[serde(default)]
    pub cached_url: Option<String>,
    #[serde(default)]
    pub png_url: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub metadata: Option<RawMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Option<Vec<Attribute>>,
}

#[derive(Debug, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    #[serde(default)]
    pub value: Value,
}

impl NftEntry {
    /// 生エントリを検証する。`index` はエラー報告用の位置
    pub fn parse(index: usize, value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CatalogError::malformed(index, e.to_string()))
    }

    pub fn into_record(self, index: usize) -> Result<CollectibleRecord> {
        let token_id = non_empty(self.token_id)
            .ok_or_else(|| CatalogError::malformed(index, "missing field `tokenId`"))?;

        let metadata = self.raw.and_then(|r| r.metadata).unwrap_or_default();

        let display_name = non_empty(self.name)
            .or_else(|| non_empty(metadata.name))
            .ok_or_else(|| {
                CatalogError::malformed(index, format!("token {token_id}: missing field `name`"))
            })?;

        let image = self.image.unwrap_or_default();
        // originalUrl や raw.metadata.image は ipfs:// のままのことが多いので、
        // http(s) で取れるものだけを採用する
        let image_url = non_empty(image.cached_url)
            .or_else(|| non_empty(image.png_url))
            .or_else(|| fetchable(image.original_url))
            .or_else(|| fetchable(metadata.image));

        let mut attributes = Vec::new();
        for attr in metadata.attributes.unwrap_or_default() {
            let value = match attr.value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(CatalogError::malformed(
                        index,
                        format!(
                            "token {token_id}: trait {:?} has a non-scalar value",
                            attr.trait_type
                        ),
                    ));
                }
            };
            attributes.push(Trait {
                trait_type: attr.trait_type,
                value,
            });
        }

        Ok(CollectibleRecord {
            token_id,
            display_name,
            image_url,
            attributes,
        })
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// ブラウザからそのまま読める URL のみ通す
fn fetchable(s: Option<String>) -> Option<String> {
    non_empty(s).filter(|s| {
        let lower = s.trim_start().to_ascii_lowercase();
        lower.starts_with("https://") || lower.starts_with("http://")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_cached_url_over_png_url() {
        let entry = NftEntry::parse(
            0,
            json!({
                "tokenId": "7",
                "name": "Doodle #7",
                "image": { "cachedUrl": "https://cache/7", "pngUrl": "https://png/7" }
            }),
        )
        .unwrap();
        let record = entry.into_record(0).unwrap();
        assert_eq!(record.image_url.as_deref(), Some("https://cache/7"));
    }

    #[test]
    fn empty_urls_count_as_absent() {
        let entry = NftEntry::parse(
            0,
            json!({
                "tokenId": "8",
                "name": "Doodle #8",
                "image": { "cachedUrl": "", "pngUrl": null }
            }),
        )
        .unwrap();
        let record = entry.into_record(0).unwrap();
        assert!(!record.image_available());
    }

    #[test]
    fn unresolved_ipfs_uri_is_not_an_image() {
        let entry = NftEntry::parse(
            0,
            json!({
                "tokenId": "1",
                "name": "Doodle #1",
                "image": { "cachedUrl": null, "pngUrl": null, "originalUrl": "ipfs://Qm/1" },
                "raw": { "metadata": { "image": "ipfs://Qm/1" } }
            }),
        )
        .unwrap();
        let record = entry.into_record(0).unwrap();
        assert!(!record.image_available());
        assert_eq!(record.image_url, None);
    }

    #[test]
    fn http_original_url_is_used_when_gateway_urls_are_missing() {
        let entry = NftEntry::parse(
            0,
            json!({
                "tokenId": "2",
                "name": "Doodle #2",
                "image": { "cachedUrl": null, "originalUrl": "ipfs://Qm/2" },
                "raw": { "metadata": { "image": "https://gateway/ipfs/Qm/2" } }
            }),
        )
        .unwrap();
        let record = entry.into_record(0).unwrap();
        assert_eq!(record.image_url.as_deref(), Some("https://gateway/ipfs/Qm/2"));
    }

    #[test]
    fn name_falls_back_to_raw_metadata() {
        let entry = NftEntry::parse(
            3,
            json!({
                "tokenId": "9",
                "raw": { "metadata": { "name": "Doodle #9" } }
            }),
        )
        .unwrap();
        assert_eq!(entry.into_record(3).unwrap().display_name, "Doodle #9");
    }

    #[test]
    fn scalar_trait_values_are_rendered_as_text() {
        let entry = NftEntry::parse(
            0,
            json!({
                "tokenId": "1",
                "name": "Doodle #1",
                "raw": { "metadata": { "attributes": [
                    { "trait_type": "face", "value": "happy" },
                    { "trait_type": "level", "value": 3 },
                    { "trait_type": "ghost", "value": null }
                ]}}
            }),
        )
        .unwrap();
        let record = entry.into_record(0).unwrap();
        assert_eq!(record.attributes.len(), 2);
        assert_eq!(record.attribute("level"), Some("3"));
        assert_eq!(record.attribute("ghost"), None);
    }

    #[test]
    fn numeric_token_id_is_malformed() {
        let err = NftEntry::parse(4, json!({ "tokenId": 12, "name": "x" })).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedRecord { index: 4, .. }));
    }

    #[test]
    fn object_trait_value_is_malformed() {
        let entry = NftEntry::parse(
            0,
            json!({
                "tokenId": "1",
                "name": "Doodle #1",
                "raw": { "metadata": { "attributes": [
                    { "trait_type": "hair", "value": { "nested": true } }
                ]}}
            }),
        )
        .unwrap();
        assert!(matches!(
            entry.into_record(0),
            Err(CatalogError::MalformedRecord { .. })
        ));
    }
}
