//! Cart line types.

use palmetto_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

/// Product display data captured when a product is first added to the cart.
///
/// The snapshot is first-write-wins: once a line exists for a product id,
/// later adds with different display data leave the stored fields unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Unique key for the line within the cart.
    pub id: ProductId,
    /// Product name at time of first add.
    pub name: String,
    /// Unit price at time of first add.
    pub price: Price,
    /// Image reference at time of first add.
    pub image: String,
}

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product id, unique within the cart.
    pub id: ProductId,
    /// Display name snapshot.
    pub name: String,
    /// Unit price snapshot.
    pub price: Price,
    /// Image reference snapshot.
    pub image: String,
    /// Line quantity, always at least 1.
    pub quantity: u32,
    /// Whether this line is included in the next checkout subset.
    pub selected: bool,
}

impl CartLine {
    /// Create a fresh line (quantity 1, not selected) from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            price: snapshot.price,
            image: snapshot.image,
            quantity: 1,
            selected: false,
        }
    }

    /// Total price for this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}
