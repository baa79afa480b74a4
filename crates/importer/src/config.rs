use storage::models::athlete::BELTS;

use crate::normalize::{Day, Gender, TokenTable};

/// Everything the validator needs to know about what a valid row looks like.
///
/// Passed in explicitly at call time so the same process can validate uploads
/// with different rules (e.g. a tournament without brown belts).
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub belts: Vec<String>,
    pub gender_tokens: TokenTable<Gender>,
    pub day_tokens: TokenTable<Day>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            belts: BELTS.iter().map(|b| b.to_string()).collect(),
            gender_tokens: TokenTable::default(),
            day_tokens: TokenTable::default(),
        }
    }
}

impl ImportConfig {
    /// Canonical spelling of a belt colour, matched case-insensitively.
    pub fn belt(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        self.belts
            .iter()
            .find(|belt| belt.eq_ignore_ascii_case(raw))
            .map(String::as_str)
    }

    pub fn accepted_belts(&self) -> String {
        self.belts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belt_lookup_is_case_insensitive() {
        let config = ImportConfig::default();
        assert_eq!(config.belt("yellow"), Some("Yellow"));
        assert_eq!(config.belt(" BLACK "), Some("Black"));
        assert_eq!(config.belt("Orange"), None);
        assert_eq!(config.belt(""), None);
    }

    #[test]
    fn test_custom_belt_set() {
        let config = ImportConfig {
            belts: vec!["Red".to_string()],
            ..ImportConfig::default()
        };
        assert_eq!(config.belt("red"), Some("Red"));
        assert_eq!(config.belt("white"), None);
        assert_eq!(config.accepted_belts(), "Red");
    }

    #[test]
    fn test_default_belts_listed_in_order() {
        assert_eq!(
            ImportConfig::default().accepted_belts(),
            "White, Yellow, Blue, Purple, Green, Brown, Black"
        );
    }
}
