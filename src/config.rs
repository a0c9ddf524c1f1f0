use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::Locator;
use crate::{HarnessError, Result, Viewport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub product_path: String,
    /// Upper bound on random selection attempts before giving up.
    pub max_variant_attempts: u32,
    pub timings: Timings,
    pub selectors: Selectors,
    pub browser: BrowserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://comfrt.com".to_string(),
            product_path: "/products/cloud-zip-hoodie?variant=41732312891436".to_string(),
            max_variant_attempts: 10,
            timings: Timings::default(),
            selectors: Selectors::default(),
            browser: BrowserConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
    #[serde(with = "humantime_serde")]
    pub selection_settle: Duration,
    #[serde(with = "humantime_serde")]
    pub decrement_settle: Duration,
    #[serde(with = "humantime_serde")]
    pub selection_stabilize: Duration,
    #[serde(with = "humantime_serde")]
    pub verify_settle: Duration,
    #[serde(with = "humantime_serde")]
    pub cart_update_settle: Duration,
    #[serde(with = "humantime_serde")]
    pub checkout_load_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub checkout_fallback_settle: Duration,
    #[serde(with = "humantime_serde")]
    pub navigation_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub element_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub load_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_millis(5000),
            selection_settle: Duration::from_millis(1000),
            decrement_settle: Duration::from_millis(1000),
            selection_stabilize: Duration::from_millis(1500),
            verify_settle: Duration::from_millis(2000),
            cart_update_settle: Duration::from_millis(2000),
            checkout_load_timeout: Duration::from_secs(15),
            checkout_fallback_settle: Duration::from_secs(3),
            navigation_timeout: Duration::from_secs(45),
            element_timeout: Duration::from_secs(30),
            load_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub product: ProductSelectors,
    pub cart: CartSelectors,
}

/// Selectors for the product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSelectors {
    pub title: String,
    pub price: String,
    pub variant_wrapper: String,
    pub option_group: String,
    pub group_label: String,
    pub option_input: String,
    pub add_to_cart_wrapper: String,
    pub add_to_cart_button: String,
    pub add_to_cart_text: String,
    pub bundle_items: String,
    pub bundle_add_to_cart_text: String,
}

impl Default for ProductSelectors {
    fn default() -> Self {
        Self {
            title: "#product_hero_title-default-product-hero-title_2_rc > h1".to_string(),
            price: "#product_hero_price-default-product-hero-price_3_rc span:not([class])"
                .to_string(),
            variant_wrapper: "#product_hero_options-default-product-hero-options_4_rc"
                .to_string(),
            option_group: "fieldset".to_string(),
            group_label: "legend".to_string(),
            option_input: "input[type='radio']".to_string(),
            add_to_cart_wrapper:
                "#product_hero_add_to_cart_button-default-product-hero-add-to-cart-button_6_rc"
                    .to_string(),
            add_to_cart_button: "button".to_string(),
            add_to_cart_text: "Add to cart".to_string(),
            bundle_items: "#product_hero_bundle-default-product-bundle_7_rc div:has(div:has(a[href]))"
                .to_string(),
            bundle_add_to_cart_text: "Add bundle to cart".to_string(),
        }
    }
}

impl ProductSelectors {
    /// Label element targeting an option input by id.
    pub fn option_label(&self, input_id: &str) -> String {
        format!("label[for=\"{input_id}\"]")
    }

    /// Primary call-to-action. The pre-order button shares the wrapper, hence the text filter.
    pub fn add_to_cart(&self) -> Locator {
        Locator::css(format!("{} {}", self.add_to_cart_wrapper, self.add_to_cart_button))
            .has_text(&self.add_to_cart_text)
    }

    pub fn bundle_add_to_cart(&self) -> Locator {
        Locator::css(format!("{} {}", self.add_to_cart_wrapper, self.add_to_cart_button))
            .has_text(&self.bundle_add_to_cart_text)
    }
}

/// Selectors for the slideout cart drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartSelectors {
    pub open_button: String,
    pub drawer: String,
    pub close_button: String,
    pub line_items: String,
    pub line_id: String,
    pub quantity_input: String,
    pub price: String,
    pub price_text: String,
    pub increase: String,
    pub decrease: String,
    pub remove_button: String,
    pub remove_text: String,
    pub checkout_button: String,
}

impl Default for CartSelectors {
    fn default() -> Self {
        Self {
            open_button: "#cart-icon-bubble".to_string(),
            drawer: "#cart > div.cartContent".to_string(),
            close_button: "label[for='close-drawer']".to_string(),
            line_items: "div[id*='cart_items-']".to_string(),
            line_id: ":scope > div".to_string(),
            quantity_input: "input[readonly]".to_string(),
            price: "p".to_string(),
            price_text: "$".to_string(),
            increase: "text=\"+\"".to_string(),
            decrease: "text=\"-\"".to_string(),
            remove_button: "button[type='submit']".to_string(),
            remove_text: "Remove".to_string(),
            checkout_button: "button:has-text(\"Checkout\")".to_string(),
        }
    }
}

impl CartSelectors {
    /// Line wrapper for one variant, relative to the drawer.
    pub fn line(&self, variant_id: &str) -> String {
        format!("{} > div[id=\"{variant_id}\"]", self.line_items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub node_command: String,
    pub headless: bool,
    pub viewport: Viewport,
    /// Requests whose URL contains any of these substrings are aborted.
    pub blocked_resources: Vec<String>,
    /// localStorage entries written before any page script runs.
    pub local_storage: BTreeMap<String, String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let blocked = [
            ".jpg",
            ".jpeg",
            ".png",
            ".gif",
            ".webp",
            "google-analytics",
            "facebook.net",
            "tiktok",
            "klaviyo",
            "gorgias",
            "alia",
        ];
        let storage = [
            ("alia-dismissed", "true"),
            ("alia-popup-dismissed", "true"),
            ("mystery-offer-dismissed", "true"),
        ];
        Self {
            node_command: "node".to_string(),
            headless: true,
            viewport: Viewport::default(),
            blocked_resources: blocked.iter().map(|s| s.to_string()).collect(),
            local_storage: storage
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Config {
    /// `~/.config/sfh/config.toml`, when a home directory is known.
    pub fn central_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config").join("sfh").join("config.toml"))
    }

    /// Load from an explicit path, else the central config, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::central_config_path() {
                Some(central) if central.is_file() => Self::from_file(&central),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| HarnessError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(HarnessError::Config("base_url must not be empty".to_string()));
        }
        Url::parse(&self.base_url)?;
        if self.timings.cache_ttl.is_zero() {
            return Err(HarnessError::Config(
                "timings.cache_ttl must be greater than zero".to_string(),
            ));
        }
        if self.max_variant_attempts == 0 {
            return Err(HarnessError::Config(
                "max_variant_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute product page URL.
    pub fn product_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?.join(&self.product_path)?)
    }

    /// Absolute URL for a storefront path such as `/cart`.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?.join(path)?)
    }
}
