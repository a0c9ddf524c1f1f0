use serde::{Deserialize, Serialize};

/// One selectable value within a [`VariantGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    /// Display label; the raw value when no label resolves.
    pub name: String,
    pub value: String,
    pub is_selected: bool,
    pub is_available: bool,
    /// Identifier used to target the option; unique within its group.
    pub input_id: String,
}

/// One configurable dimension of a product (color, size, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantGroup {
    /// Normalized, lower-cased dimension name.
    #[serde(rename = "type")]
    pub group_type: String,
    pub options: Vec<VariantOption>,
}

impl VariantGroup {
    pub fn new(group_type: impl Into<String>, options: Vec<VariantOption>) -> Self {
        Self {
            group_type: group_type.into(),
            options,
        }
    }

    /// Case-insensitive match on the group type.
    pub fn is_type(&self, group_type: &str) -> bool {
        self.group_type.eq_ignore_ascii_case(group_type)
    }

    pub fn option(&self, input_id: &str) -> Option<&VariantOption> {
        self.options.iter().find(|o| o.input_id == input_id)
    }

    pub fn available_options(&self) -> impl Iterator<Item = &VariantOption> {
        self.options.iter().filter(|o| o.is_available)
    }

    pub fn has_available(&self) -> bool {
        self.options.iter().any(|o| o.is_available)
    }

    pub fn selected_options(&self) -> impl Iterator<Item = &VariantOption> {
        self.options.iter().filter(|o| o.is_selected)
    }
}

/// The group/option pair a selection call applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSelection {
    pub group: VariantGroup,
    pub option: VariantOption,
}
