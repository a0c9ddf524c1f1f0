//! Storefront Harness Library
//!
//! Page-object layer for end-to-end storefront tests: reads a product page's
//! variant groups, selects options, and drives the slideout cart, verifying
//! every cart write against a reloaded page before reporting success.
//!
//! # Module Overview
//!
//! - [`dom`] - The DOM capability set everything else is written against
//! - [`browser`] - Playwright-backed [`dom::DomQuery`] implementation
//! - [`catalog`] - Variant extraction with a short-lived snapshot cache
//! - [`selector`] - Explicit and random variant selection
//! - [`cart`] - Slideout cart reads and quantity reconciliation
//! - [`product`] / [`checkout`] - Product and checkout page objects
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sfh_lib::{CartView, Config, PlaywrightSession, ProductPage, SessionOptions};
//! use sfh_lib::types::QuantityChange;
//!
//! # async fn example() -> sfh_lib::Result<()> {
//! let config = Config::default();
//! let session = Arc::new(PlaywrightSession::launch(SessionOptions::from(&config)).await?);
//!
//! let mut product = ProductPage::new(Arc::clone(&session), &config)?;
//! product.goto().await?;
//! product.select_random_variant().await?;
//! let item = product.add_to_cart().await?;
//!
//! let cart = CartView::new(session, config.selectors.cart.clone(), config.timings.clone());
//! cart.change_item_quantity(&QuantityChange {
//!     variant_id: item.variant_id,
//!     quantity: 3,
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod dom;
pub mod error;
pub mod output;
pub mod product;
pub mod reconcile;
pub mod selector;
pub mod types;
pub mod viewport;

pub use browser::{PlaywrightSession, SessionOptions};
pub use cart::{CartView, CheckoutNavigation};
pub use catalog::{LabelClassifier, VariantCatalog};
pub use checkout::CheckoutPage;
pub use config::Config;
pub use dom::{DomQuery, ElementHandle, LoadState, Locator, WaitState};
pub use error::{ErrorCategory, ErrorPayload, HarnessError, Result};
pub use output::{
    AddToCartOutput, BundleOutput, CartOutput, CheckoutReport, ErrorOutput, HarnessOutput,
    SelectOutput, VariantsOutput, SFH_OUTPUT_VERSION,
};
pub use product::ProductPage;
pub use reconcile::reconcile;
pub use selector::VariantSelector;
pub use viewport::Viewport;
