//! Token appearance resolution.

use itempiles_domain::{Item, PileData, TokenAppearance};

use crate::infrastructure::ports::TokenImagePort;

/// Container images by state, a single item's icon when showing one item,
/// otherwise the document's own appearance.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTokenImage;

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl TokenImagePort for DefaultTokenImage {
    fn resolve(
        &self,
        pile: &PileData,
        items: &[Item],
        base: &TokenAppearance,
        is_empty: bool,
    ) -> TokenAppearance {
        if !pile.enabled {
            return base.clone();
        }

        if pile.is_container {
            let img = if pile.locked {
                non_empty(&pile.locked_image)
            } else if pile.closed {
                non_empty(&pile.closed_image)
            } else if is_empty {
                non_empty(&pile.empty_image)
            } else {
                non_empty(&pile.opened_image)
            };
            let img = img
                .or_else(|| non_empty(&pile.closed_image))
                .or_else(|| base.img.clone());
            return TokenAppearance {
                img,
                scale: base.scale,
            };
        }

        match items {
            [single] if pile.display_one => TokenAppearance {
                img: single.img.clone().or_else(|| base.img.clone()),
                scale: if pile.override_single_item_scale {
                    pile.single_item_scale
                } else {
                    base.scale
                },
            },
            _ => base.clone(),
        }
    }
}
