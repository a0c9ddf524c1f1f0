use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Variant group not found: {0}")]
    GroupNotFound(String),

    #[error("Variant ID not found: {input_id} (group {group})")]
    OptionNotFound { group: String, input_id: String },

    #[error("No variant groups found")]
    NoVariantGroups,

    #[error("Item with variant ID {0} not found in cart")]
    ItemNotFound(String),

    #[error("{control} control for item with variant ID {variant_id} not found")]
    ControlNotFound { control: String, variant_id: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Variant option \"{0}\" is not available")]
    OptionUnavailable(String),

    #[error("No available variant options found")]
    NoAvailableOptions,

    #[error("Add to cart button is not enabled")]
    AddToCartDisabled,

    #[error("Bundle add to cart button is not visible")]
    BundleAddToCartHidden,

    #[error("Failed to update quantity for variant {variant_id}. Expected {expected}, but got {actual}")]
    QuantityMismatch {
        variant_id: String,
        expected: u32,
        actual: u32,
    },

    #[error("Selected variant option does not match: expected {expected}, got {actual}")]
    SelectionMismatch { expected: String, actual: String },

    #[error("No viable variant combination after {attempts} attempts; add to cart never became enabled")]
    NoViableVariant { attempts: u32 },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),
}

impl HarnessError {
    pub fn browser(message: impl Into<String>) -> Self {
        HarnessError::Browser(message.into())
    }

    pub fn control_not_found(control: impl Into<String>, variant_id: impl Into<String>) -> Self {
        HarnessError::ControlNotFound {
            control: control.into(),
            variant_id: variant_id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            HarnessError::GroupNotFound(_)
            | HarnessError::OptionNotFound { .. }
            | HarnessError::NoVariantGroups
            | HarnessError::ItemNotFound(_)
            | HarnessError::ControlNotFound { .. }
            | HarnessError::ElementNotFound(_) => ErrorCategory::NotFound,
            HarnessError::OptionUnavailable(_)
            | HarnessError::NoAvailableOptions
            | HarnessError::AddToCartDisabled
            | HarnessError::BundleAddToCartHidden
            | HarnessError::NoViableVariant { .. } => ErrorCategory::Precondition,
            HarnessError::QuantityMismatch { .. } | HarnessError::SelectionMismatch { .. } => {
                ErrorCategory::Reconciliation
            }
            HarnessError::Timeout(_) => ErrorCategory::Timeout,
            HarnessError::Browser(_) => ErrorCategory::Browser,
            HarnessError::Config(_) | HarnessError::InvalidUrl(_) | HarnessError::Io(_) => {
                ErrorCategory::Config
            }
            HarnessError::Serialization(_) => ErrorCategory::Unknown,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let remediation = match self {
            HarnessError::GroupNotFound(_) | HarnessError::OptionNotFound { .. } => {
                "Run `sfh variants` to list the group types and input ids the page renders."
            }
            HarnessError::NoVariantGroups => {
                "Check the product selectors in the config; the option wrapper rendered no fieldsets."
            }
            HarnessError::ItemNotFound(_) => {
                "Add the variant to the cart first (`sfh add-to-cart`) and pass the id it reports."
            }
            HarnessError::ControlNotFound { .. } | HarnessError::ElementNotFound(_) => {
                "The page markup may have changed; update the selectors in the config."
            }
            HarnessError::OptionUnavailable(_) | HarnessError::NoAvailableOptions => {
                "Pick an option that is in stock, or let `sfh select` choose a random available one."
            }
            HarnessError::AddToCartDisabled | HarnessError::NoViableVariant { .. } => {
                "Select a full, in-stock variant combination; raise max_variant_attempts if the catalog is large."
            }
            HarnessError::BundleAddToCartHidden => {
                "The product page does not render a bundle; use a bundle product URL."
            }
            HarnessError::QuantityMismatch { .. } | HarnessError::SelectionMismatch { .. } => {
                "The storefront did not persist the change; rerun and inspect the cart after a reload."
            }
            HarnessError::Timeout(msg) => {
                if msg.to_ascii_lowercase().contains("navigat") {
                    "Increase timings.navigation_timeout or check that the storefront is reachable."
                } else {
                    "Increase timings.element_timeout or check that the element renders."
                }
            }
            HarnessError::Browser(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("playwright npm package is missing") {
                    "Install Playwright (e.g., `npm install playwright` and `npx playwright install chromium`)."
                } else if lower.contains("not found on path") || lower.contains("node command") {
                    "Install Node.js and ensure the node binary is on PATH."
                } else {
                    "Re-run with --verbose (or SFH_LOG=debug) for helper output."
                }
            }
            HarnessError::Config(_) | HarnessError::InvalidUrl(_) => {
                "Check the config file and flags (e.g., --base-url https://shop.example.com)."
            }
            HarnessError::Io(_) => "Check file paths/permissions.",
            HarnessError::Serialization(_) => {
                "Re-run with --verbose; file an issue if persistent."
            }
        };
        ErrorPayload::new(self.category(), self.to_string(), remediation)
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    NotFound,
    Precondition,
    Reconciliation,
    Timeout,
    Browser,
    Config,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
