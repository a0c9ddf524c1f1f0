//! The narrow DOM capability set the harness depends on.
//!
//! Everything above this module (catalog, selector, cart) talks to the page
//! only through [`DomQuery`], so the automation engine behind it can be
//! swapped: the crate ships a Playwright-backed session in [`crate::browser`],
//! and the integration tests drive an in-memory storefront.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Opaque reference to an element resolved by [`DomQuery::locate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element descriptor: a selector, an optional text filter and an optional scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locator {
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within: Option<ElementHandle>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            has_text: None,
            within: None,
        }
    }

    /// Keep only matches whose text contains `text`.
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    /// Resolve relative to `parent` instead of the document.
    pub fn within(mut self, parent: &ElementHandle) -> Self {
        self.within = Some(parent.clone());
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(text) = &self.has_text {
            write!(f, " (has text {text:?})")?;
        }
        if let Some(parent) = &self.within {
            write!(f, " within {parent}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitState {
    Attached,
    Detached,
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

/// DOM Query Facade.
///
/// Every call may suspend and none of them promises read-after-write
/// consistency: a click returning `Ok` says nothing about what the next read
/// will observe.
#[async_trait]
pub trait DomQuery: Send + Sync {
    async fn goto(&self, url: &str, state: LoadState, timeout: Duration) -> Result<()>;

    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>>;

    async fn attribute(&self, handle: &ElementHandle, name: &str) -> Result<Option<String>>;

    async fn text(&self, handle: &ElementHandle) -> Result<Option<String>>;

    async fn click(&self, handle: &ElementHandle) -> Result<()>;

    async fn fill(&self, handle: &ElementHandle, value: &str) -> Result<()>;

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool>;

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool>;

    async fn is_checked(&self, handle: &ElementHandle) -> Result<bool>;

    /// Wait until the first match of `locator` reaches `state`.
    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration)
        -> Result<()>;

    async fn reload(&self, state: LoadState) -> Result<()>;

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> Result<()>;

    async fn sleep(&self, duration: Duration);

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;
}

/// First match of `locator`, if any.
pub async fn first<D: DomQuery + ?Sized>(
    dom: &D,
    locator: &Locator,
) -> Result<Option<ElementHandle>> {
    Ok(dom.locate(locator).await?.into_iter().next())
}

/// Whether the first match of `locator` exists and is visible.
pub async fn first_visible<D: DomQuery + ?Sized>(dom: &D, locator: &Locator) -> Result<bool> {
    match first(dom, locator).await? {
        Some(handle) => dom.is_visible(&handle).await,
        None => Ok(false),
    }
}
