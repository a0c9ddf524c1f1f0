//! Data model shared by the catalog, selector and cart components.
//!
//! - [`products`] - variant options, groups and selections
//! - [`cart`] - cart lines and the request/response shapes of cart operations

pub mod cart;
pub mod products;

pub use cart::{AddToCartResult, CartItemDetails, CartItemQuery, CartLine, QuantityChange};
pub use products::{VariantGroup, VariantOption, VariantSelection};
pub use crate::viewport::Viewport;
