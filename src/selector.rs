//! Variant selection: apply a named option, or a random available one.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::catalog::VariantCatalog;
use crate::config::Timings;
use crate::dom::{first, first_visible, DomQuery, ElementHandle, LoadState, Locator};
use crate::types::{VariantGroup, VariantOption, VariantSelection};
use crate::{HarnessError, Result};

/// Default cap on random selection attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

pub struct VariantSelector<D: DomQuery + ?Sized> {
    dom: Arc<D>,
    catalog: VariantCatalog<D>,
    timings: Timings,
    max_attempts: u32,
    rng: StdRng,
}

impl<D: DomQuery + ?Sized> VariantSelector<D> {
    pub fn new(dom: Arc<D>, catalog: VariantCatalog<D>, timings: Timings) -> Self {
        Self {
            dom,
            catalog,
            timings,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Seed the random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn catalog(&self) -> &VariantCatalog<D> {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut VariantCatalog<D> {
        &mut self.catalog
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Select the option `input_id` in the group of type `group_type`.
    ///
    /// Fails when the group or option is missing or the option is unavailable.
    /// Selecting an already selected option does nothing.
    pub async fn select_variant(&mut self, group_type: &str, input_id: &str) -> Result<()> {
        let groups = self.catalog.get_variants(false).await?;
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

        if !option.is_available {
            return Err(HarnessError::OptionUnavailable(input_id.to_string()));
        }
        if option.is_selected {
            debug!(input_id, "variant is already selected");
            return Ok(());
        }

        let wrapper = Locator::css(&self.catalog.selectors().variant_wrapper);
        let scope = first(self.dom.as_ref(), &wrapper).await?;
        self.click_option(scope.as_ref(), input_id).await
    }

    /// Click the label for `input_id`, then invalidate and let dependent UI settle.
    pub(crate) async fn click_option(
        &mut self,
        scope: Option<&ElementHandle>,
        input_id: &str,
    ) -> Result<()> {
        let mut locator = Locator::css(self.catalog.selectors().option_label(input_id));
        if let Some(scope) = scope {
            locator = locator.within(scope);
        }
        let label = first(self.dom.as_ref(), &locator)
            .await?
            .ok_or_else(|| HarnessError::ElementNotFound(locator.to_string()))?;
        self.dom.click(&label).await?;

        self.catalog.invalidate();
        self.dom.sleep(self.timings.selection_settle).await;
        Ok(())
    }

    /// Pick and apply a uniformly random available option.
    ///
    /// `groups` seeds the first attempt; later attempts re-read the catalog.
    /// A selection that leaves add-to-cart disabled is discarded and excluded
    /// from later picks in this call. Fails with `NoViableVariant` once every
    /// available option has been tried or the attempt cap is reached.
    pub async fn select_random_variant(
        &mut self,
        groups: Option<&[VariantGroup]>,
    ) -> Result<VariantSelection> {
        let mut provided = groups.map(|g| Arc::new(g.to_vec()));
        let mut tried: HashSet<(String, String)> = HashSet::new();

        for attempt in 1..=self.max_attempts {
            let groups = match provided.take() {
                Some(groups) => groups,
                None => self.catalog.get_variants(false).await?,
            };
            let pool = without_tried(&groups, &tried);
            let (picked, option) = match pick_random(&pool, &mut self.rng) {
                Ok(pick) => pick,
                Err(HarnessError::NoAvailableOptions) if !tried.is_empty() => {
                    warn!(tried = tried.len(), "every available option leaves add to cart disabled");
                    return Err(HarnessError::NoViableVariant {
                        attempts: attempt - 1,
                    });
                }
                Err(err) => return Err(err),
            };
            let group = groups
                .iter()
                .find(|g| g.group_type == picked.group_type)
                .cloned()
                .unwrap_or(picked);
            info!(
                attempt,
                group = %group.group_type,
                value = %option.value,
                "selecting random variant"
            );

            self.select_variant(&group.group_type, &option.input_id).await?;
            if self.is_add_to_cart_enabled().await? {
                return Ok(VariantSelection { group, option });
            }
            warn!(attempt, input_id = %option.input_id, "add to cart not enabled after selection, retrying");
            tried.insert((group.group_type.clone(), option.input_id.clone()));
        }

        Err(HarnessError::NoViableVariant {
            attempts: self.max_attempts,
        })
    }

    pub async fn is_add_to_cart_enabled(&self) -> Result<bool> {
        let locator = self.catalog.selectors().add_to_cart();
        first_visible(self.dom.as_ref(), &locator).await
    }

    /// Groups with at least one selected option, keeping only the selected ones.
    pub async fn selected_options(&mut self) -> Result<Vec<VariantGroup>> {
        self.dom.sleep(self.timings.selection_stabilize).await;
        let groups = self.catalog.get_variants(true).await?;
        Ok(groups
            .iter()
            .filter_map(|group| {
                let selected: Vec<VariantOption> = group.selected_options().cloned().collect();
                (!selected.is_empty()).then(|| VariantGroup::new(group.group_type.clone(), selected))
            })
            .collect())
    }

    /// Reload and confirm `selection` is still the selected option of its group.
    pub async fn verify_selection(&mut self, selection: &VariantSelection) -> Result<()> {
        self.dom.reload(LoadState::Load).await?;
        self.catalog.invalidate();
        self.dom.sleep(self.timings.verify_settle).await;

        let selected = self.selected_options().await?;
        let group = selected
            .iter()
            .find(|g| g.is_type(&selection.group.group_type))
            .ok_or_else(|| HarnessError::GroupNotFound(selection.group.group_type.clone()))?;
        let option = group
            .option(&selection.option.input_id)
            .ok_or_else(|| HarnessError::OptionNotFound {
                group: group.group_type.clone(),
                input_id: selection.option.input_id.clone(),
            })?;

        if option.name != selection.option.name || option.value != selection.option.value {
            return Err(HarnessError::SelectionMismatch {
                expected: format!("\"{}\" ({})", selection.option.name, selection.option.value),
                actual: format!("\"{}\" ({})", option.name, option.value),
            });
        }
        Ok(())
    }
}

/// `groups` with the already tried `(type, input id)` pairs removed.
fn without_tried(groups: &[VariantGroup], tried: &HashSet<(String, String)>) -> Vec<VariantGroup> {
    groups
        .iter()
        .map(|group| {
            let options = group
                .options
                .iter()
                .filter(|o| !tried.contains(&(group.group_type.clone(), o.input_id.clone())))
                .cloned()
                .collect();
            VariantGroup::new(group.group_type.clone(), options)
        })
        .collect()
}

/// Uniform choice of a group with availability, then of an available option in it.
pub fn pick_random<R: Rng>(
    groups: &[VariantGroup],
    rng: &mut R,
) -> Result<(VariantGroup, VariantOption)> {
    if groups.is_empty() {
        return Err(HarnessError::NoVariantGroups);
    }
    let available: Vec<&VariantGroup> = groups.iter().filter(|g| g.has_available()).collect();
    if available.is_empty() {
        return Err(HarnessError::NoAvailableOptions);
    }

    let group = available[rng.random_range(0..available.len())];
    let options: Vec<&VariantOption> = group.available_options().collect();
    let option = options[rng.random_range(0..options.len())];
    Ok((group.clone(), option.clone()))
}
