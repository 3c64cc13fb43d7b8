//! カタログから配る神経衰弱の盤面

use rand::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};

/// 伏せたカード1枚。同じ `token_id` のカードが2枚ある
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: String,
    pub token_id: String,
    pub image_url: String,
}

impl Card {
    /// ペアの相方なら true
    pub fn matches(&self, other: &Card) -> bool {
        self.token_id == other.token_id && self.id != other.id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    cards: Vec<Card>,
}

impl Board {
    /// `rows * cols` 枚（偶数に切り捨て）のカードを配る
    ///
    /// 画像のあるレコードだけを使い、1件につき `"{i}-a"` / `"{i}-b"` の
    /// 2枚を作ってから全体をシャッフルする。
    pub fn deal<R: Rng + ?Sized>(
        catalog: &Catalog,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let total = rows
            .checked_mul(cols)
            .ok_or(CatalogError::InvalidBoard { rows, cols })?;
        let even_total = total - total % 2;
        if even_total == 0 {
            return Err(CatalogError::InvalidBoard { rows, cols });
        }
        let pairs = even_total / 2;

        let chosen = catalog.sample_matching(pairs, rng, |r| r.image_available())?;

        let mut cards = Vec::with_capacity(even_total);
        for (i, record) in chosen.into_iter().enumerate() {
            let Some(url) = &record.image_url else { continue };
            for side in ["a", "b"] {
                cards.push(Card {
                    id: format!("{i}-{side}"),
                    token_id: record.token_id.clone(),
                    image_url: url.clone(),
                });
            }
        }
        cards.shuffle(rng);

        debug!(rows, cols, pairs, "board dealt");
        Ok(Self { rows, cols, cards })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSource;
    use rand::rngs::StdRng;
    use serde_json::json;
    use std::collections::HashMap;

    fn catalog(with_images: usize, without_images: usize) -> Catalog {
        let mut nfts = Vec::new();
        for i in 0..with_images {
            nfts.push(json!({
                "tokenId": i.to_string(),
                "name": format!("Doodle #{i}"),
                "image": { "cachedUrl": format!("https://img/{i}") }
            }));
        }
        for i in with_images..with_images + without_images {
            nfts.push(json!({ "tokenId": i.to_string(), "name": format!("Doodle #{i}") }));
        }
        Catalog::load(&CatalogSource::Json(json!({ "nfts": nfts }).to_string())).unwrap()
    }

    #[test]
    fn odd_board_drops_one_cell() {
        let c = catalog(10, 0);
        let board = Board::deal(&c, 3, 3, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(board.cards().len(), 8);
        assert_eq!(board.pair_count(), 4);
    }

    #[test]
    fn every_token_appears_exactly_twice() {
        let c = catalog(10, 0);
        let board = Board::deal(&c, 4, 4, &mut StdRng::seed_from_u64(2)).unwrap();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for card in board.cards() {
            *counts.entry(card.token_id.as_str()).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 8);
        assert!(counts.values().all(|&n| n == 2));
    }

    #[test]
    fn records_without_images_are_never_dealt() {
        let c = catalog(2, 6);
        let err = Board::deal(&c, 2, 3, &mut StdRng::seed_from_u64(3)).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InsufficientData {
                requested: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn single_cell_board_is_rejected() {
        let c = catalog(2, 0);
        assert!(matches!(
            Board::deal(&c, 1, 1, &mut StdRng::seed_from_u64(4)),
            Err(CatalogError::InvalidBoard { rows: 1, cols: 1 })
        ));
    }

    #[test]
    fn oversized_board_is_rejected_not_overflowed() {
        let c = catalog(2, 0);
        assert!(matches!(
            Board::deal(&c, usize::MAX, 2, &mut StdRng::seed_from_u64(6)),
            Err(CatalogError::InvalidBoard { cols: 2, .. })
        ));
    }

    #[test]
    fn pair_halves_match_each_other_only() {
        let c = catalog(4, 0);
        let board = Board::deal(&c, 2, 2, &mut StdRng::seed_from_u64(5)).unwrap();
        let first = &board.cards()[0];
        let partners: Vec<_> = board.cards().iter().filter(|c| first.matches(c)).collect();
        assert_eq!(partners.len(), 1);
        assert!(!first.matches(first));
    }
}
