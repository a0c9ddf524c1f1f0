//! Variant catalog: the product's option groups, extracted from the rendered
//! page and cached for a bounded time.
//!
//! The cache is an explicit snapshot + capture timestamp. It is discarded
//! (never patched) when the TTL lapses, when a caller forces a refresh, or
//! when a component that mutated option state calls [`VariantCatalog::invalidate`].

mod classify;

pub use classify::LabelClassifier;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ProductSelectors;
use crate::dom::{first, DomQuery, ElementHandle, Locator};
use crate::types::{VariantGroup, VariantOption};
use crate::Result;

/// Reference TTL for a catalog snapshot.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
struct Snapshot {
    groups: Arc<Vec<VariantGroup>>,
    captured_at: Instant,
}

/// Owns the cached snapshot for one page session. Never share across sessions.
pub struct VariantCatalog<D: DomQuery + ?Sized> {
    dom: Arc<D>,
    selectors: ProductSelectors,
    classifier: LabelClassifier,
    ttl: Duration,
    snapshot: Option<Snapshot>,
}

impl<D: DomQuery + ?Sized> VariantCatalog<D> {
    pub fn new(dom: Arc<D>, selectors: ProductSelectors) -> Self {
        Self {
            dom,
            selectors,
            classifier: LabelClassifier::default(),
            ttl: DEFAULT_CACHE_TTL,
            snapshot: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_classifier(mut self, classifier: LabelClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn selectors(&self) -> &ProductSelectors {
        &self.selectors
    }

    pub fn classifier(&self) -> &LabelClassifier {
        &self.classifier
    }

    /// Cached groups, re-extracted when forced, absent, or older than the TTL.
    pub async fn get_variants(&mut self, force_refresh: bool) -> Result<Arc<Vec<VariantGroup>>> {
        let now = Instant::now();
        if let Some(snapshot) = &self.snapshot {
            let expired = now.duration_since(snapshot.captured_at) > self.ttl;
            if !force_refresh && !expired {
                return Ok(Arc::clone(&snapshot.groups));
            }
        }

        let groups = Arc::new(self.extract().await?);
        self.snapshot = Some(Snapshot {
            groups: Arc::clone(&groups),
            captured_at: now,
        });
        Ok(groups)
    }

    /// Drop the snapshot; the next read re-extracts in full.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    pub fn is_cached(&self) -> bool {
        self.snapshot.is_some()
    }

    async fn extract(&self) -> Result<Vec<VariantGroup>> {
        let wrapper = Locator::css(&self.selectors.variant_wrapper);
        let Some(wrapper) = first(self.dom.as_ref(), &wrapper).await? else {
            warn!(selector = %self.selectors.variant_wrapper, "variant wrapper not found");
            return Ok(Vec::new());
        };
        let containers = self
            .dom
            .locate(&Locator::css(&self.selectors.option_group).within(&wrapper))
            .await?;
        Ok(extract_groups(self.dom.as_ref(), &self.selectors, &self.classifier, &containers).await)
    }
}

/// Build groups from option-group containers (fieldsets).
///
/// Failures on a single container or input are logged and skipped; the
/// result holds whatever could be read.
pub async fn extract_groups<D: DomQuery + ?Sized>(
    dom: &D,
    selectors: &ProductSelectors,
    classifier: &LabelClassifier,
    containers: &[ElementHandle],
) -> Vec<VariantGroup> {
    let mut groups: Vec<VariantGroup> = Vec::new();

    for container in containers {
        let group = match extract_group(dom, selectors, classifier, container).await {
            Ok(Some(group)) => group,
            Ok(None) => continue,
            Err(err) => {
                warn!(container = %container, error = %err, "failed to process option group");
                continue;
            }
        };

        if let Some(existing) = groups.iter_mut().find(|g| g.group_type == group.group_type) {
            let before = existing.options.len();
            for option in group.options {
                let duplicate = !option.input_id.is_empty()
                    && existing.options.iter().any(|o| o.input_id == option.input_id);
                if !duplicate {
                    existing.options.push(option);
                }
            }
            debug!(
                group = %existing.group_type,
                merged = existing.options.len() - before,
                "merged options into existing group"
            );
        } else {
            debug!(group = %group.group_type, options = group.options.len(), "created group");
            groups.push(group);
        }
    }

    debug!(
        groups = ?groups
            .iter()
            .map(|g| format!("{} ({} options)", g.group_type, g.options.len()))
            .collect::<Vec<_>>(),
        "extracted variant groups"
    );
    groups
}

async fn extract_group<D: DomQuery + ?Sized>(
    dom: &D,
    selectors: &ProductSelectors,
    classifier: &LabelClassifier,
    container: &ElementHandle,
) -> Result<Option<VariantGroup>> {
    let legend = first(dom, &Locator::css(&selectors.group_label).within(container)).await?;
    let label = match legend {
        Some(handle) => dom.text(&handle).await?,
        None => None,
    };
    let Some(label) = label.filter(|l| !l.trim().is_empty()) else {
        warn!(container = %container, "no option group label found, skipping");
        return Ok(None);
    };
    debug!(label = %label.trim(), "processing option group");

    let group_type = classifier.classify(&label);
    let inputs = dom
        .locate(&Locator::css(&selectors.option_input).within(container))
        .await?;

    let mut options = Vec::with_capacity(inputs.len());
    for input in &inputs {
        match extract_option(dom, selectors, container, input).await {
            Ok(option) => options.push(option),
            Err(err) => warn!(input = %input, error = %err, "failed to process variant option"),
        }
    }

    if options.is_empty() {
        debug!(group = %group_type, "option group has no options, skipping");
        return Ok(None);
    }
    Ok(Some(VariantGroup::new(group_type, options)))
}

async fn extract_option<D: DomQuery + ?Sized>(
    dom: &D,
    selectors: &ProductSelectors,
    container: &ElementHandle,
    input: &ElementHandle,
) -> Result<VariantOption> {
    let value = dom.attribute(input, "value").await?.unwrap_or_default();
    let input_id = dom.attribute(input, "id").await?.unwrap_or_default();

    let mut label = String::new();
    if !input_id.is_empty() {
        let locator = Locator::css(selectors.option_label(&input_id)).within(container);
        if let Some(handle) = first(dom, &locator).await? {
            label = dom.text(&handle).await?.unwrap_or_default();
        }
    }

    let is_selected = dom.is_checked(input).await?;
    let is_available = dom.is_enabled(input).await?;
    let label = label.trim();

    Ok(VariantOption {
        name: if label.is_empty() {
            value.clone()
        } else {
            label.to_string()
        },
        value,
        is_selected,
        is_available,
        input_id,
    })
}
