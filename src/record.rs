use serde::Serialize;

/// コレクティブル1件の表示用データ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectibleRecord {
    pub token_id: String,
    pub display_name: String,
    pub image_url: Option<String>,
    pub attributes: Vec<Trait>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trait {
    pub trait_type: String,
    pub value: String,
}

impl CollectibleRecord {
    /// 使える画像 URL がなければ false。代替画像は呼び出し側で選ぶ
    pub fn image_available(&self) -> bool {
        self.image_url.is_some()
    }

    /// `trait_type` の最初の値
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|t| t.trait_type == trait_type)
            .map(|t| t.value.as_str())
    }
}
