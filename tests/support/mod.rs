//! In-memory storefront answering the default selectors.
//!
//! Cart lines keep a server quantity and a rendered quantity; only a reload
//! copies the first into the second, the way the real drawer lags its writes.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sfh_lib::config::Selectors;
use sfh_lib::dom::{DomQuery, ElementHandle, LoadState, Locator, WaitState};
use sfh_lib::{HarnessError, Result};

pub const PRODUCT_URL: &str = "https://shop.example.com/products/cloud-zip-hoodie?variant=V1";
pub const CHECKOUT_URL: &str = "https://shop.example.com/checkouts/cn/abc123";

#[derive(Debug, Clone)]
pub struct FakeOption {
    pub id: String,
    pub value: String,
    pub label: Option<String>,
    pub checked: bool,
    pub enabled: bool,
    pub broken: bool,
}

impl FakeOption {
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn unlabeled(mut self) -> Self {
        self.label = None;
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Reading this input's attributes fails.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

pub fn opt(id: &str, value: &str) -> FakeOption {
    FakeOption {
        id: id.to_string(),
        value: value.to_string(),
        label: Some(value.to_string()),
        checked: false,
        enabled: true,
        broken: false,
    }
}

#[derive(Debug, Clone)]
pub struct FakeGroup {
    pub legend: Option<String>,
    pub options: Vec<FakeOption>,
    pub broken: bool,
}

impl FakeGroup {
    /// Locating this fieldset's legend fails.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

pub fn group(legend: &str, options: Vec<FakeOption>) -> FakeGroup {
    FakeGroup {
        legend: Some(legend.to_string()),
        options,
        broken: false,
    }
}

pub fn unlabeled_group(options: Vec<FakeOption>) -> FakeGroup {
    FakeGroup {
        legend: None,
        options,
        broken: false,
    }
}

#[derive(Debug, Clone)]
struct FakeLine {
    variant_id: String,
    server: u32,
    rendered: u32,
    price: String,
}

#[derive(Debug)]
struct State {
    url: String,
    has_wrapper: bool,
    groups: Vec<FakeGroup>,
    bundles: Vec<Vec<FakeGroup>>,
    blocking: HashSet<String>,
    title: String,
    price: String,
    has_price: bool,
    lines: Vec<FakeLine>,
    drawer_open: bool,
    lost_writes: u32,
    checkout_times_out: bool,
    log: Vec<String>,
    extractions: usize,
}

pub struct FakeStorefront {
    selectors: Selectors,
    state: Mutex<State>,
}

/// Black/Sage/Rust (Rust sold out) and S/M/L, with Black and S selected.
pub fn hoodie_groups() -> Vec<FakeGroup> {
    vec![
        group(
            "Color",
            vec![
                opt("c1", "Black").checked(),
                opt("c2", "Sage"),
                opt("c3", "Rust").disabled(),
            ],
        ),
        group(
            "Size",
            vec![opt("s1", "S").checked(), opt("s2", "M"), opt("s3", "L")],
        ),
    ]
}

impl FakeStorefront {
    pub fn new() -> Self {
        Self::with_groups(hoodie_groups())
    }

    pub fn with_groups(groups: Vec<FakeGroup>) -> Self {
        Self {
            selectors: Selectors::default(),
            state: Mutex::new(State {
                url: "about:blank".to_string(),
                has_wrapper: true,
                groups,
                bundles: Vec::new(),
                blocking: HashSet::new(),
                title: "Cloud Zip Hoodie".to_string(),
                price: "$49.99 CAD".to_string(),
                has_price: true,
                lines: Vec::new(),
                drawer_open: false,
                lost_writes: 0,
                checkout_times_out: false,
                log: Vec::new(),
                extractions: 0,
            }),
        }
    }

    pub fn without_wrapper(self) -> Self {
        self.state.lock().unwrap().has_wrapper = false;
        self
    }

    /// The product page renders no price element.
    pub fn without_price(self) -> Self {
        self.state.lock().unwrap().has_price = false;
        self
    }

    pub fn with_bundle(self, items: Vec<Vec<FakeGroup>>) -> Self {
        self.state.lock().unwrap().bundles = items;
        self
    }

    /// Add-to-cart hides while any of these options is checked.
    pub fn blocking(self, ids: &[&str]) -> Self {
        self.state.lock().unwrap().blocking = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_cart_line(self, variant_id: &str, quantity: u32, price: &str) -> Self {
        self.state.lock().unwrap().lines.push(FakeLine {
            variant_id: variant_id.to_string(),
            server: quantity,
            rendered: quantity,
            price: price.to_string(),
        });
        self
    }

    pub fn checkout_times_out(self) -> Self {
        self.state.lock().unwrap().checkout_times_out = true;
        self
    }

    /// The next `count` quantity clicks update the drawer but never persist.
    pub fn lose_writes(&self, count: u32) {
        self.state.lock().unwrap().lost_writes = count;
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().unwrap().url = url.to_string();
    }

    /// Change an option behind the cache's back.
    pub fn set_enabled(&self, id: &str, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        for group in state.groups.iter_mut() {
            for option in group.options.iter_mut().filter(|o| o.id == id) {
                option.enabled = enabled;
            }
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    pub fn count(&self, entry: &str) -> usize {
        self.log().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn extractions(&self) -> usize {
        self.state.lock().unwrap().extractions
    }

    pub fn server_quantity(&self, variant_id: &str) -> Option<u32> {
        let state = self.state.lock().unwrap();
        state
            .lines
            .iter()
            .find(|l| l.variant_id == variant_id)
            .map(|l| l.server)
    }

    pub fn checked_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .groups
            .iter()
            .chain(state.bundles.iter().flatten())
            .flat_map(|g| g.options.iter())
            .filter(|o| o.checked)
            .map(|o| o.id.clone())
            .collect()
    }

    pub fn drawer_open(&self) -> bool {
        self.state.lock().unwrap().drawer_open
    }
}

impl Default for FakeStorefront {
    fn default() -> Self {
        Self::new()
    }
}

fn handles<I: IntoIterator<Item = String>>(ids: I) -> Vec<ElementHandle> {
    ids.into_iter().map(ElementHandle::new).collect()
}

fn parts(handle: &ElementHandle) -> Vec<&str> {
    handle.as_str().split(':').collect()
}

/// Fieldsets by scope: `main` or `b{k}` for bundle item k.
fn scope_groups<'a>(state: &'a State, scope: &str) -> Option<&'a Vec<FakeGroup>> {
    match scope {
        "main" => Some(&state.groups),
        other => other
            .strip_prefix('b')
            .and_then(|k| k.parse::<usize>().ok())
            .and_then(|k| state.bundles.get(k)),
    }
}

fn scope_groups_mut<'a>(state: &'a mut State, scope: &str) -> Option<&'a mut Vec<FakeGroup>> {
    match scope {
        "main" => Some(&mut state.groups),
        other => other
            .strip_prefix('b')
            .and_then(|k| k.parse::<usize>().ok())
            .and_then(move |k| state.bundles.get_mut(k)),
    }
}

/// Scope name for a wrapper, bundle item or fieldset handle.
fn scope_of(handle: &ElementHandle) -> Option<(String, Option<usize>)> {
    let p = parts(handle);
    match p.as_slice() {
        ["wrapper"] => Some(("main".to_string(), None)),
        ["bundle", k] => Some((format!("b{k}"), None)),
        ["fieldset", scope, i] => Some((scope.to_string(), i.parse().ok())),
        _ => None,
    }
}

fn label_target(selector: &str) -> Option<&str> {
    selector
        .strip_prefix("label[for=\"")
        .and_then(|rest| rest.strip_suffix("\"]"))
}

fn line_target<'a>(selector: &'a str, line_items: &str) -> Option<&'a str> {
    selector
        .strip_prefix(line_items)
        .and_then(|rest| rest.strip_prefix(" > div[id=\""))
        .and_then(|rest| rest.strip_suffix("\"]"))
}

impl FakeStorefront {
    fn atc_selector(&self) -> String {
        format!(
            "{} {}",
            self.selectors.product.add_to_cart_wrapper, self.selectors.product.add_to_cart_button
        )
    }

    fn resolve(&self, state: &mut State, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let product = &self.selectors.product;
        let cart = &self.selectors.cart;
        let sel = locator.selector.as_str();
        let text = locator.has_text.as_deref();
        let within = locator.within.as_ref();

        if sel == product.variant_wrapper && within.is_none() {
            return Ok(if state.has_wrapper {
                handles(["wrapper".to_string()])
            } else {
                Vec::new()
            });
        }
        if sel == product.bundle_items {
            return Ok(handles((0..state.bundles.len()).map(|k| format!("bundle:{k}"))));
        }
        if sel == product.option_group {
            let Some((scope, _)) = within.and_then(scope_of) else {
                return Ok(Vec::new());
            };
            if scope == "main" {
                state.extractions += 1;
            }
            let count = scope_groups(state, &scope).map_or(0, Vec::len);
            return Ok(handles((0..count).map(|i| format!("fieldset:{scope}:{i}"))));
        }
        if sel == product.group_label {
            let Some((scope, Some(i))) = within.and_then(scope_of) else {
                return Ok(Vec::new());
            };
            let group = scope_groups(state, &scope).and_then(|g| g.get(i));
            return match group {
                Some(g) if g.broken => Err(HarnessError::browser("fieldset detached")),
                Some(g) if g.legend.is_some() => Ok(handles([format!("legend:{scope}:{i}")])),
                _ => Ok(Vec::new()),
            };
        }
        if sel == product.option_input {
            let Some((scope, Some(i))) = within.and_then(scope_of) else {
                return Ok(Vec::new());
            };
            let count = scope_groups(state, &scope)
                .and_then(|g| g.get(i))
                .map_or(0, |g| g.options.len());
            return Ok(handles((0..count).map(|j| format!("input:{scope}:{i}:{j}"))));
        }
        if let Some(id) = label_target(sel) {
            let Some((scope, index)) = within.and_then(scope_of) else {
                return Ok(Vec::new());
            };
            let groups = scope_groups(state, &scope).cloned().unwrap_or_default();
            for (i, group) in groups.iter().enumerate() {
                if index.is_some_and(|only| only != i) {
                    continue;
                }
                if let Some(j) = group.options.iter().position(|o| o.id == id) {
                    return Ok(handles([format!("label:{scope}:{i}:{j}")]));
                }
            }
            return Ok(Vec::new());
        }
        if sel == self.atc_selector() {
            return Ok(match text {
                Some(t) if t == product.add_to_cart_text => handles(["atc".to_string()]),
                Some(t) if t == product.bundle_add_to_cart_text && !state.bundles.is_empty() => {
                    handles(["bundle-atc".to_string()])
                }
                _ => Vec::new(),
            });
        }
        if sel == product.title {
            return Ok(handles(["title".to_string()]));
        }
        if sel == product.price {
            return Ok(if state.has_price {
                handles(["price".to_string()])
            } else {
                Vec::new()
            });
        }

        if sel == cart.open_button {
            return Ok(handles(["open-cart".to_string()]));
        }
        if sel == cart.drawer {
            return Ok(handles(["drawer".to_string()]));
        }
        if sel == cart.close_button {
            return Ok(handles(["close".to_string()]));
        }
        if sel == cart.checkout_button {
            return Ok(handles(["checkout".to_string()]));
        }
        if sel == cart.line_items {
            return Ok(handles(
                state.lines.iter().map(|l| format!("line:{}", l.variant_id)),
            ));
        }
        if let Some(vid) = line_target(sel, &cart.line_items) {
            let exists = state.lines.iter().any(|l| l.variant_id == vid);
            return Ok(if exists {
                handles([format!("line:{vid}")])
            } else {
                Vec::new()
            });
        }

        // Remaining cart selectors are scoped to a line.
        let Some(vid) = within.and_then(|h| h.as_str().strip_prefix("line:")) else {
            if sel == "form, [data-checkout-form]" {
                return Ok(handles(["form".to_string()]));
            }
            return Ok(Vec::new());
        };
        let prefix = if sel == cart.line_id {
            "lineid"
        } else if sel == cart.quantity_input {
            "qty"
        } else if sel == cart.price && text == Some(cart.price_text.as_str()) {
            "lprice"
        } else if sel == cart.increase {
            "inc"
        } else if sel == cart.decrease {
            "dec"
        } else if sel == cart.remove_button && text == Some(cart.remove_text.as_str()) {
            "remove"
        } else {
            return Ok(Vec::new());
        };
        Ok(handles([format!("{prefix}:{vid}")]))
    }

    fn option<'a>(state: &'a State, handle: &ElementHandle) -> Result<&'a FakeOption> {
        let p = parts(handle);
        let found = match p.as_slice() {
            [_, scope, i, j] => {
                let (i, j): (usize, usize) = (
                    i.parse().unwrap_or(usize::MAX),
                    j.parse().unwrap_or(usize::MAX),
                );
                scope_groups(state, scope)
                    .and_then(|g| g.get(i))
                    .and_then(|g| g.options.get(j))
            }
            _ => None,
        };
        found.ok_or_else(|| HarnessError::browser(format!("unknown option handle {handle}")))
    }

    fn atc_visible(state: &State) -> bool {
        !state
            .groups
            .iter()
            .flat_map(|g| g.options.iter())
            .any(|o| o.checked && state.blocking.contains(&o.id))
    }

    fn line_mut<'a>(state: &'a mut State, vid: &str) -> Result<&'a mut FakeLine> {
        state
            .lines
            .iter_mut()
            .find(|l| l.variant_id == vid)
            .ok_or_else(|| HarnessError::browser(format!("line {vid} detached")))
    }

    fn bump(state: &mut State, vid: &str, up: bool) -> Result<()> {
        let persist = if state.lost_writes > 0 {
            state.lost_writes -= 1;
            false
        } else {
            true
        };
        let line = Self::line_mut(state, vid)?;
        if up {
            line.rendered += 1;
            if persist {
                line.server += 1;
            }
        } else {
            line.rendered = line.rendered.saturating_sub(1);
            if persist {
                line.server = line.server.saturating_sub(1);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DomQuery for FakeStorefront {
    async fn goto(&self, url: &str, _state: LoadState, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("goto:{url}"));
        state.url = url.to_string();
        Ok(())
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let mut state = self.state.lock().unwrap();
        self.resolve(&mut state, locator)
    }

    async fn attribute(&self, handle: &ElementHandle, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        let p = parts(handle);
        match (p.as_slice(), name) {
            (["input", ..], _) => {
                let option = Self::option(&state, handle)?;
                if option.broken {
                    return Err(HarnessError::browser("input detached"));
                }
                Ok(match name {
                    "value" => Some(option.value.clone()),
                    "id" => Some(option.id.clone()),
                    _ => None,
                })
            }
            (["qty", vid], "value") => Ok(state
                .lines
                .iter()
                .find(|l| l.variant_id == *vid)
                .map(|l| l.rendered.to_string())),
            (["lineid", vid], "id") => Ok(Some(vid.to_string())),
            _ => Ok(None),
        }
    }

    async fn text(&self, handle: &ElementHandle) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        let p = parts(handle);
        match p.as_slice() {
            ["legend", scope, i] => Ok(scope_groups(&state, scope)
                .and_then(|g| g.get(i.parse::<usize>().unwrap_or(usize::MAX)))
                .and_then(|g| g.legend.clone())),
            ["label", ..] => Ok(Self::option(&state, handle)?.label.clone()),
            ["title"] => Ok(Some(format!("  {}  ", state.title))),
            ["price"] => Ok(Some(state.price.clone())),
            ["lprice", vid] => Ok(state
                .lines
                .iter()
                .find(|l| l.variant_id == *vid)
                .map(|l| l.price.clone())),
            _ => Ok(None),
        }
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("click:{handle}"));
        let p = parts(handle);
        match p.as_slice() {
            ["label", scope, i, j] => {
                let (i, j): (usize, usize) = (i.parse().unwrap_or(0), j.parse().unwrap_or(0));
                let group = scope_groups_mut(&mut state, scope)
                    .and_then(|g| g.get_mut(i))
                    .ok_or_else(|| HarnessError::browser("label detached"))?;
                for (k, option) in group.options.iter_mut().enumerate() {
                    option.checked = k == j;
                }
            }
            ["atc"] => {
                let vid = url::Url::parse(&state.url)
                    .ok()
                    .and_then(|u| {
                        u.query_pairs()
                            .find(|(k, _)| k == "variant")
                            .map(|(_, v)| v.into_owned())
                    })
                    .unwrap_or_default();
                let price = state.price.clone();
                match state.lines.iter().position(|l| l.variant_id == vid) {
                    Some(i) => state.lines[i].server += 1,
                    None => state.lines.push(FakeLine {
                        variant_id: vid,
                        server: 1,
                        rendered: 1,
                        price,
                    }),
                }
            }
            ["bundle-atc"] => {
                let price = state.price.clone();
                state.lines.push(FakeLine {
                    variant_id: "BUNDLE".to_string(),
                    server: 1,
                    rendered: 1,
                    price,
                });
            }
            ["open-cart"] => state.drawer_open = true,
            ["close"] => state.drawer_open = false,
            ["inc", vid] => Self::bump(&mut state, vid, true)?,
            ["dec", vid] => Self::bump(&mut state, vid, false)?,
            ["remove", vid] => {
                let vid = vid.to_string();
                state.lines.retain(|l| l.variant_id != vid);
            }
            ["checkout"] => {
                if !state.checkout_times_out {
                    state.url = CHECKOUT_URL.to_string();
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn fill(&self, handle: &ElementHandle, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("fill:{handle}:{value}"));
        Ok(())
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool> {
        let state = self.state.lock().unwrap();
        let p = parts(handle);
        Ok(match p.as_slice() {
            ["drawer"] | ["line", _] => state.drawer_open,
            ["atc"] => Self::atc_visible(&state),
            ["bundle-atc"] => !state.bundles.is_empty(),
            _ => true,
        })
    }

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(Self::option(&state, handle)?.enabled)
    }

    async fn is_checked(&self, handle: &ElementHandle) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(Self::option(&state, handle)?.checked)
    }

    async fn wait_for(&self, locator: &Locator, wait: WaitState, _timeout: Duration) -> Result<()> {
        let state = self.state.lock().unwrap();
        if locator.selector == self.selectors.cart.drawer
            && wait == WaitState::Visible
            && !state.drawer_open
        {
            return Err(HarnessError::Timeout(format!("waiting for {locator}")));
        }
        Ok(())
    }

    async fn reload(&self, _state: LoadState) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push("reload".to_string());
        for line in state.lines.iter_mut() {
            line.rendered = line.server;
        }
        state.drawer_open = false;
        Ok(())
    }

    async fn wait_for_load_state(&self, _state: LoadState, timeout: Duration) -> Result<()> {
        let state = self.state.lock().unwrap();
        if state.checkout_times_out {
            return Err(HarnessError::Timeout(format!(
                "load state not reached within {timeout:?}"
            )));
        }
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap();
        state.log.push(format!("sleep:{}", duration.as_millis()));
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }
}
