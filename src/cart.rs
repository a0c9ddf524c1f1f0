//! Slideout cart drawer.
//!
//! Nothing here is cached: the drawer's rendered quantities do not reflect
//! writes until the document is reloaded, so every read goes to the page and
//! every quantity change ends with a reload-and-compare.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{CartSelectors, Timings};
use crate::dom::{first, first_visible, DomQuery, ElementHandle, LoadState, Locator, WaitState};
use crate::reconcile::reconcile;
use crate::types::cart::parse_quantity;
use crate::types::{AddToCartResult, CartItemDetails, CartItemQuery, CartLine, QuantityChange};
use crate::{HarnessError, Result};

/// How the checkout navigation wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutNavigation {
    Loaded,
    /// The load wait timed out; a fixed settle interval was used instead.
    Degraded,
}

pub struct CartView<D: DomQuery + ?Sized> {
    dom: Arc<D>,
    selectors: CartSelectors,
    timings: Timings,
}

impl<D: DomQuery + ?Sized> CartView<D> {
    pub fn new(dom: Arc<D>, selectors: CartSelectors, timings: Timings) -> Self {
        Self {
            dom,
            selectors,
            timings,
        }
    }

    fn drawer(&self) -> Locator {
        Locator::css(&self.selectors.drawer)
    }

    pub async fn is_open(&self) -> Result<bool> {
        first_visible(self.dom.as_ref(), &self.drawer()).await
    }

    /// Open the drawer unless it is already visible.
    pub async fn open(&self) -> Result<()> {
        if self.is_open().await? {
            return Ok(());
        }
        let button = Locator::css(&self.selectors.open_button);
        let handle = first(self.dom.as_ref(), &button)
            .await?
            .ok_or_else(|| HarnessError::ElementNotFound(button.to_string()))?;
        self.dom.click(&handle).await?;
        self.dom
            .wait_for(&self.drawer(), WaitState::Visible, self.timings.element_timeout)
            .await
    }

    /// Click the close control when the drawer is visible.
    ///
    /// Does not wait for the drawer to hide: the reference storefront keeps it
    /// in the document and never reports it hidden, so callers must not
    /// assert on hidden state afterwards.
    pub async fn close(&self) -> Result<()> {
        let Some(drawer) = first(self.dom.as_ref(), &self.drawer()).await? else {
            return Ok(());
        };
        if !self.dom.is_visible(&drawer).await? {
            return Ok(());
        }
        let close = Locator::css(&self.selectors.close_button).within(&drawer);
        let handle = first(self.dom.as_ref(), &close)
            .await?
            .ok_or_else(|| HarnessError::ElementNotFound(close.to_string()))?;
        self.dom.click(&handle).await
    }

    /// Number of rendered line items.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.line_handles().await?.len())
    }

    async fn line_handles(&self) -> Result<Vec<ElementHandle>> {
        let Some(drawer) = first(self.dom.as_ref(), &self.drawer()).await? else {
            return Ok(Vec::new());
        };
        self.dom
            .locate(&Locator::css(&self.selectors.line_items).within(&drawer))
            .await
    }

    async fn visible_line(&self, variant_id: &str) -> Result<Option<ElementHandle>> {
        let Some(drawer) = first(self.dom.as_ref(), &self.drawer()).await? else {
            return Ok(None);
        };
        let line = Locator::css(self.selectors.line(variant_id)).within(&drawer);
        match first(self.dom.as_ref(), &line).await? {
            Some(handle) if self.dom.is_visible(&handle).await? => Ok(Some(handle)),
            _ => Ok(None),
        }
    }

    /// The line for `variant_id`, opening the drawer once if it is not visible.
    async fn locate_line(&self, variant_id: &str) -> Result<ElementHandle> {
        if let Some(line) = self.visible_line(variant_id).await? {
            return Ok(line);
        }
        self.open().await?;
        self.visible_line(variant_id)
            .await?
            .ok_or_else(|| HarnessError::ItemNotFound(variant_id.to_string()))
    }

    async fn read_quantity(&self, line: &ElementHandle) -> Result<u32> {
        let input = Locator::css(&self.selectors.quantity_input).within(line);
        let raw = match first(self.dom.as_ref(), &input).await? {
            Some(handle) => self.dom.attribute(&handle, "value").await?,
            None => None,
        };
        Ok(parse_quantity(raw.as_deref()))
    }

    async fn read_price(&self, line: &ElementHandle) -> Result<String> {
        let price = Locator::css(&self.selectors.price)
            .has_text(&self.selectors.price_text)
            .within(line);
        Ok(match first(self.dom.as_ref(), &price).await? {
            Some(handle) => self.dom.text(&handle).await?.unwrap_or_default(),
            None => String::new(),
        })
    }

    /// Quantity after a reload; a line that disappeared reads as zero.
    async fn reread_quantity(&self, variant_id: &str) -> Result<u32> {
        match self.visible_line(variant_id).await? {
            Some(line) => self.read_quantity(&line).await,
            None => {
                warn!(variant_id, "line not rendered after reload");
                Ok(0)
            }
        }
    }

    pub async fn get_cart_item_details(&self, variant_id: &str) -> Result<CartItemDetails> {
        let line = self.locate_line(variant_id).await?;
        Ok(CartItemDetails {
            quantity: self.read_quantity(&line).await?,
            item_price: self.read_price(&line).await?.trim().to_string(),
        })
    }

    /// Drive the line's quantity to `change.quantity` with the relative
    /// controls, then reload and require the re-read quantity to match.
    pub async fn change_item_quantity(&self, change: &QuantityChange) -> Result<()> {
        let variant_id = change.variant_id.as_str();
        let target = change.quantity;

        self.open().await?;
        let line = self.locate_line(variant_id).await?;
        let current = self.read_quantity(&line).await?;
        if current == target {
            debug!(variant_id, quantity = target, "quantity already at target");
            return Ok(());
        }

        let (control, label, steps) = if target > current {
            (&self.selectors.increase, "Increase", target - current)
        } else {
            (&self.selectors.decrease, "Decrease", current - target)
        };
        let locator = Locator::css(control).within(&line);
        let button = first(self.dom.as_ref(), &locator)
            .await?
            .ok_or_else(|| HarnessError::control_not_found(label, variant_id))?;

        debug!(variant_id, from = current, to = target, steps, "adjusting quantity");
        for _ in 0..steps {
            self.dom.click(&button).await?;
        }
        if target < current {
            self.dom.sleep(self.timings.decrement_settle).await;
        }

        reconcile(
            &target,
            move || async move {
                self.dom.reload(LoadState::Load).await?;
                self.open().await
            },
            move || async move { self.reread_quantity(variant_id).await },
            |expected, actual| HarnessError::QuantityMismatch {
                variant_id: variant_id.to_string(),
                expected: *expected,
                actual,
            },
        )
        .await?;

        info!(variant_id, quantity = target, "updated quantity");
        Ok(())
    }

    /// Trigger removal of the line. The resulting cart state is not verified.
    pub async fn remove_item(&self, variant_id: &str) -> Result<()> {
        self.open().await?;
        let line = self.locate_line(variant_id).await?;
        let remove = Locator::css(&self.selectors.remove_button)
            .has_text(&self.selectors.remove_text)
            .within(&line);
        match first(self.dom.as_ref(), &remove).await? {
            Some(handle) if self.dom.is_visible(&handle).await? => {
                self.dom.click(&handle).await?;
                info!(variant_id, "removed cart line");
                Ok(())
            }
            _ => Err(HarnessError::control_not_found("Remove", variant_id)),
        }
    }

    /// Every rendered line, opening the drawer first.
    pub async fn all_items(&self) -> Result<Vec<CartLine>> {
        self.open().await?;
        let mut lines = Vec::new();
        for handle in self.line_handles().await? {
            let id_locator = Locator::css(&self.selectors.line_id).within(&handle);
            let variant_id = match first(self.dom.as_ref(), &id_locator).await? {
                Some(inner) => self.dom.attribute(&inner, "id").await?.unwrap_or_default(),
                None => String::new(),
            };
            lines.push(CartLine {
                variant_id,
                quantity: self.read_quantity(&handle).await?,
                item_price: self.read_price(&handle).await?,
            });
        }
        Ok(lines)
    }

    /// Whether a rendered line matches the variant id and quantity exactly and
    /// its price text contains `query.price`.
    pub async fn check_for_item_in_cart(&self, query: &CartItemQuery) -> Result<bool> {
        let lines = self.all_items().await?;
        let found = lines.iter().any(|line| query.matches(line));
        if !found {
            debug!(?query, ?lines, "no matching cart line");
        }
        Ok(found)
    }

    /// Whether a just-added item shows up as a line with `quantity`.
    ///
    /// An item whose price the product page did not render cannot be matched
    /// and reads as absent.
    pub async fn check_for_added_item(&self, item: &AddToCartResult, quantity: u32) -> Result<bool> {
        match CartItemQuery::for_added(item, quantity) {
            Some(query) => self.check_for_item_in_cart(&query).await,
            None => {
                warn!(variant_id = %item.variant_id, "added item has no price, cannot match a cart line");
                Ok(false)
            }
        }
    }

    /// Click through to checkout. Load timing is best-effort: a timed-out
    /// wait degrades to a fixed settle interval.
    pub async fn proceed_to_checkout(&self) -> Result<CheckoutNavigation> {
        self.open().await?;
        let checkout = Locator::css(&self.selectors.checkout_button);
        let handle = first(self.dom.as_ref(), &checkout)
            .await?
            .ok_or_else(|| HarnessError::ElementNotFound(checkout.to_string()))?;
        self.dom.click(&handle).await?;

        match self
            .dom
            .wait_for_load_state(LoadState::Load, self.timings.checkout_load_timeout)
            .await
        {
            Ok(()) => Ok(CheckoutNavigation::Loaded),
            Err(HarnessError::Timeout(msg)) => {
                warn!(%msg, "checkout load wait timed out, settling instead");
                self.dom.sleep(self.timings.checkout_fallback_settle).await;
                Ok(CheckoutNavigation::Degraded)
            }
            Err(err) => Err(err),
        }
    }
}
