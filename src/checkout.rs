//! Checkout page boundary. Only load detection lives here; the form itself
//! belongs to the scenarios that drive it.

use std::sync::Arc;
use std::time::Duration;

use crate::dom::{DomQuery, LoadState, Locator, WaitState};
use crate::Result;

const CHECKOUT_FORM: &str = "form, [data-checkout-form]";
const CHECKOUT_FORM_TIMEOUT: Duration = Duration::from_secs(10);

pub struct CheckoutPage<D: DomQuery + ?Sized> {
    dom: Arc<D>,
}

impl<D: DomQuery + ?Sized> CheckoutPage<D> {
    pub fn new(dom: Arc<D>) -> Self {
        Self { dom }
    }

    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        self.dom.goto(url, LoadState::Load, timeout).await
    }

    /// Whether the current URL is a checkout URL.
    pub async fn is_loaded(&self) -> Result<bool> {
        Ok(is_checkout_url(&self.dom.current_url().await?))
    }

    pub async fn wait_for_load(&self) -> Result<()> {
        self.dom
            .wait_for(
                &Locator::css(CHECKOUT_FORM),
                WaitState::Visible,
                CHECKOUT_FORM_TIMEOUT,
            )
            .await
    }
}

pub fn is_checkout_url(url: &str) -> bool {
    url.contains("checkout.shopify.com") || url.contains("/checkout")
}

#[cfg(test)]
mod tests {
    use super::is_checkout_url;

    #[test]
    fn recognizes_checkout_urls() {
        assert!(is_checkout_url("https://shop.example.com/checkouts/cn/abc"));
        assert!(is_checkout_url("https://checkout.shopify.com/123"));
        assert!(!is_checkout_url("https://shop.example.com/cart"));
    }
}
