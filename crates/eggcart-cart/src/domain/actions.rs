//! The cart action set. State changes only through these.

use eggcart_core::model::Product;
use rust_decimal::Decimal;

use super::state::CartLineItem;

/// Payload of an add: everything about a line except its quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    /// Product identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub unit_price: Decimal,
    /// Image reference.
    pub image: String,
    /// Whether the product is promotional.
    pub is_promotional: bool,
}

impl From<&Product> for NewCartItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.price,
            image: product.image.clone(),
            is_promotional: product.is_promotional,
        }
    }
}

/// A cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Replace every line and recompute the total.
    SetItems(Vec<CartLineItem>),
    /// Add one unit of a product.
    AddItem(NewCartItem),
    /// Remove a line entirely.
    RemoveItem(String),
    /// Set a line's quantity; zero or less removes it.
    UpdateQuantity {
        /// Product identifier.
        id: String,
        /// New quantity.
        quantity: i64,
    },
    /// Empty the cart.
    ClearCart,
}
