use crate::cart::CheckoutNavigation;
use crate::error::ErrorPayload;
use crate::types::{AddToCartResult, CartItemDetails, CartLine, VariantGroup, VariantSelection};
use serde::{Deserialize, Serialize};

/// Schema version for output payloads.
pub const SFH_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum HarnessOutput {
    Variants(VariantsOutput),
    Select(SelectOutput),
    AddToCart(AddToCartOutput),
    AddBundle(BundleOutput),
    Cart(CartOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantsOutput {
    pub version: String,
    pub url: String,
    pub groups: Vec<VariantGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOutput {
    pub version: String,
    pub selection: VariantSelection,
    /// Groups with their selected options after the change settled.
    pub selected: Vec<VariantGroup>,
    /// Whether the selection was confirmed after a reload.
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartOutput {
    pub version: String,
    pub selection: VariantSelection,
    pub item: AddToCartResult,
    pub in_cart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOutput {
    pub version: String,
    pub selections: Vec<VariantSelection>,
    pub cart_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartOutput {
    pub version: String,
    pub item: AddToCartResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<CartItemDetails>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<CartLine>,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReport {
    pub navigation: CheckoutNavigation,
    pub loaded: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    pub error: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::types::VariantOption;

    fn selection() -> VariantSelection {
        VariantSelection {
            group: VariantGroup::new("size", Vec::new()),
            option: VariantOption {
                name: "M".into(),
                value: "M".into(),
                is_selected: true,
                is_available: true,
                input_id: "s2".into(),
            },
        }
    }

    #[test]
    fn cart_output_is_tagged_and_omits_empty_fields() {
        let output = HarnessOutput::Cart(CartOutput {
            version: SFH_OUTPUT_VERSION.to_string(),
            item: AddToCartResult {
                variant_id: "41732312891436".into(),
                price: Some("$49.99 CAD".into()),
                name: "Cloud Zip Hoodie".into(),
            },
            quantity: Some(4),
            line: None,
            lines: Vec::new(),
            removed: false,
            checkout: Some(CheckoutReport {
                navigation: CheckoutNavigation::Degraded,
                loaded: true,
                url: "https://shop.example.com/checkouts/cn/1".into(),
            }),
        });

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["mode"], "cart");
        assert_eq!(json["quantity"], 4);
        assert_eq!(json["item"]["variantId"], "41732312891436");
        assert_eq!(json["checkout"]["navigation"], "degraded");
        assert!(json.get("line").is_none());
        assert!(json.get("lines").is_none());
    }

    #[test]
    fn select_output_uses_type_key_for_groups() {
        let output = HarnessOutput::Select(SelectOutput {
            version: SFH_OUTPUT_VERSION.to_string(),
            selection: selection(),
            selected: vec![VariantGroup::new("size", vec![selection().option])],
            verified: false,
        });

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["mode"], "select");
        assert_eq!(json["selection"]["group"]["type"], "size");
        assert_eq!(json["selected"][0]["options"][0]["inputId"], "s2");
    }

    #[test]
    fn error_output_parses_back() {
        let raw = r#"{"mode":"error","version":"0.1.0","error":{"category":"reconciliation","message":"Failed to update quantity"}}"#;
        let parsed: HarnessOutput = serde_json::from_str(raw).unwrap();
        match parsed {
            HarnessOutput::Error(out) => {
                assert_eq!(out.error.category, ErrorCategory::Reconciliation);
                assert!(out.error.remediation.is_none());
            }
            other => panic!("expected error output, got {other:?}"),
        }
    }
}
