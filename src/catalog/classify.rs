//! Group label classification.
//!
//! Labels on real product pages are noisy ("Cloud Zip Hoodie Color Core
//! Colors: Midnight", "Cloud Zip Hoodie Size Size: S Size Guide"), so the
//! dimension name is found by an ordered list of substring rules with a
//! trailing-word fallback.

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    needle: String,
    group_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelClassifier {
    rules: Vec<Rule>,
}

impl Default for LabelClassifier {
    fn default() -> Self {
        Self::empty().with_rule("color", "color").with_rule("size", "size")
    }
}

impl LabelClassifier {
    /// A classifier with no substring rules; everything takes the fallback.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule: labels containing `needle` (case-insensitive) classify as `group_type`.
    /// Rules are tried in insertion order.
    pub fn with_rule(mut self, needle: impl Into<String>, group_type: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into().to_lowercase(),
            group_type: group_type.into().to_lowercase(),
        });
        self
    }

    pub fn classify(&self, label: &str) -> String {
        let lower = label.to_lowercase();
        if let Some(rule) = self.rules.iter().find(|r| lower.contains(&r.needle)) {
            return rule.group_type.clone();
        }
        trailing_word(&lower).unwrap_or_else(|| lower.trim().to_string())
    }
}

/// Last word token of a label, ignoring a trailing colon.
fn trailing_word(label: &str) -> Option<String> {
    let trimmed = label.trim_end();
    let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed).trim_end();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word(*c))
        .last()
        .map(|(i, _)| i)?;
    Some(trimmed[start..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_rules_win() {
        let c = LabelClassifier::default();
        assert_eq!(c.classify("Cloud Zip Hoodie Color Core Colors: Midnight"), "color");
        assert_eq!(c.classify("Cloud Zip Hoodie Color Limited Edition:"), "color");
        assert_eq!(c.classify("Cloud Zip Hoodie Size Size: S Size Guide"), "size");
    }

    #[test]
    fn falls_back_to_trailing_word() {
        let c = LabelClassifier::default();
        assert_eq!(c.classify("Hoodie Material"), "material");
        assert_eq!(c.classify("Pick a Fit:"), "fit");
        assert_eq!(c.classify("  Length :  "), "length");
    }

    #[test]
    fn falls_back_to_whole_label_without_word_tokens() {
        let c = LabelClassifier::default();
        assert_eq!(c.classify("  ★★ "), "★★");
    }

    #[test]
    fn custom_rules_apply_in_order() {
        let c = LabelClassifier::default().with_rule("Scent", "scent");
        assert_eq!(c.classify("Candle Scent: Cedar"), "scent");
        let first_wins = LabelClassifier::empty()
            .with_rule("colour", "color")
            .with_rule("col", "column");
        assert_eq!(first_wins.classify("Colour"), "color");
    }
}
