//! Product detail page: variant selection plus the add-to-cart actions.

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::catalog::{extract_groups, VariantCatalog};
use crate::config::{Config, ProductSelectors, Timings};
use crate::dom::{first, first_visible, DomQuery, LoadState, Locator, WaitState};
use crate::selector::{pick_random, VariantSelector};
use crate::types::{AddToCartResult, VariantGroup, VariantSelection};
use crate::{HarnessError, Result};

pub struct ProductPage<D: DomQuery + ?Sized> {
    dom: Arc<D>,
    url: Url,
    selectors: ProductSelectors,
    timings: Timings,
    selector: VariantSelector<D>,
}

impl<D: DomQuery + ?Sized> ProductPage<D> {
    pub fn new(dom: Arc<D>, config: &Config) -> Result<Self> {
        let selectors = config.selectors.product.clone();
        let catalog = VariantCatalog::new(Arc::clone(&dom), selectors.clone())
            .with_ttl(config.timings.cache_ttl);
        let selector = VariantSelector::new(Arc::clone(&dom), catalog, config.timings.clone())
            .with_max_attempts(config.max_variant_attempts);

        Ok(Self {
            dom,
            url: config.product_url()?,
            selectors,
            timings: config.timings.clone(),
            selector,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn selector(&self) -> &VariantSelector<D> {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut VariantSelector<D> {
        &mut self.selector
    }

    /// Navigate to the product and pre-warm the variant cache.
    pub async fn goto(&mut self) -> Result<()> {
        self.dom
            .goto(
                self.url.as_str(),
                LoadState::DomContentLoaded,
                self.timings.navigation_timeout,
            )
            .await?;
        self.selector.catalog_mut().get_variants(false).await?;
        Ok(())
    }

    pub async fn variants(&mut self, force_refresh: bool) -> Result<Arc<Vec<VariantGroup>>> {
        self.selector.catalog_mut().get_variants(force_refresh).await
    }

    pub async fn select_variant(&mut self, group_type: &str, input_id: &str) -> Result<()> {
        self.selector.select_variant(group_type, input_id).await
    }

    pub async fn select_random_variant(&mut self) -> Result<VariantSelection> {
        self.selector.select_random_variant(None).await
    }

    pub async fn selected_options(&mut self) -> Result<Vec<VariantGroup>> {
        self.selector.selected_options().await
    }

    pub async fn verify_selection(&mut self, selection: &VariantSelection) -> Result<()> {
        self.selector.verify_selection(selection).await
    }

    /// Apply `group_type`/`input_id` and report the resulting selection.
    pub async fn select_explicit(
        &mut self,
        group_type: &str,
        input_id: &str,
    ) -> Result<VariantSelection> {
        self.select_variant(group_type, input_id).await?;
        let groups = self.variants(true).await?;
        let group = groups
            .iter()
            .find(|g| g.is_type(group_type))
            .ok_or_else(|| HarnessError::GroupNotFound(group_type.to_string()))?;
        let option = group
            .option(input_id)
            .ok_or_else(|| HarnessError::OptionNotFound {
                group: group.group_type.clone(),
                input_id: input_id.to_string(),
            })?;
        Ok(VariantSelection {
            group: group.clone(),
            option: option.clone(),
        })
    }

    pub async fn is_add_to_cart_enabled(&self) -> Result<bool> {
        self.selector.is_add_to_cart_enabled().await
    }

    pub async fn title(&self) -> Result<String> {
        let locator = Locator::css(&self.selectors.title);
        self.dom
            .wait_for(&locator, WaitState::Visible, self.timings.element_timeout)
            .await?;
        Ok(match first(self.dom.as_ref(), &locator).await? {
            Some(handle) => self.dom.text(&handle).await?.unwrap_or_default().trim().to_string(),
            None => String::new(),
        })
    }

    pub async fn price(&self) -> Result<Option<String>> {
        let locator = Locator::css(&self.selectors.price);
        Ok(match first(self.dom.as_ref(), &locator).await? {
            Some(handle) => self.dom.text(&handle).await?.map(|p| p.trim().to_string()),
            None => None,
        })
    }

    /// `variant` query parameter of the current URL, empty when absent.
    pub async fn current_variant_id(&self) -> Result<String> {
        let url = Url::parse(&self.dom.current_url().await?)?;
        Ok(variant_id_from_url(&url))
    }

    pub async fn add_to_cart(&mut self) -> Result<AddToCartResult> {
        let locator = self.selectors.add_to_cart();
        let button = match first(self.dom.as_ref(), &locator).await? {
            Some(handle) if self.dom.is_visible(&handle).await? => handle,
            _ => return Err(HarnessError::AddToCartDisabled),
        };
        self.dom.click(&button).await?;
        self.selector.catalog_mut().invalidate();

        let result = AddToCartResult {
            variant_id: self.current_variant_id().await?,
            price: self.price().await?,
            name: self.title().await?,
        };
        info!(variant_id = %result.variant_id, "added to cart");
        Ok(result)
    }

    /// Pick a random available option for every bundle item and apply it.
    ///
    /// Items without groups or without available options are skipped.
    pub async fn select_random_bundle_variants(&mut self) -> Result<Vec<VariantSelection>> {
        let items = self
            .dom
            .locate(&Locator::css(&self.selectors.bundle_items))
            .await?;
        let mut applied = Vec::new();

        for item in &items {
            let containers = self
                .dom
                .locate(&Locator::css(&self.selectors.option_group).within(item))
                .await?;
            let groups = extract_groups(
                self.dom.as_ref(),
                &self.selectors,
                self.selector.catalog().classifier(),
                &containers,
            )
            .await;
            if groups.is_empty() {
                warn!(item = %item, "no variants found for bundle item");
                continue;
            }

            let picked = pick_random(&groups, self.selector.rng_mut());
            let (group, option) = match picked {
                Ok(pick) => pick,
                Err(HarnessError::NoAvailableOptions) => {
                    warn!(item = %item, "no available options for bundle item");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if !option.is_selected {
                self.selector.click_option(Some(item), &option.input_id).await?;
            }
            applied.push(VariantSelection { group, option });
        }
        Ok(applied)
    }

    pub async fn add_bundle_to_cart(&mut self) -> Result<()> {
        if !first_visible(self.dom.as_ref(), &self.selectors.bundle_add_to_cart()).await? {
            return Err(HarnessError::BundleAddToCartHidden);
        }
        let button = first(self.dom.as_ref(), &self.selectors.bundle_add_to_cart())
            .await?
            .ok_or(HarnessError::BundleAddToCartHidden)?;
        self.dom.click(&button).await?;
        self.selector.catalog_mut().invalidate();
        Ok(())
    }
}

pub fn variant_id_from_url(url: &Url) -> String {
    url.query_pairs()
        .find(|(key, _)| key == "variant")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
