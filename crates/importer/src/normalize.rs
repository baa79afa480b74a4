use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    Saturday,
    Sunday,
}

impl Day {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized token '{token}' (expected: {accepted})")]
pub struct UnrecognizedToken {
    pub token: String,
    pub accepted: String,
}

/// Case- and whitespace-insensitive mapping from free-text tokens to one canonical value.
///
/// Tokens are stored lower-cased; `accepted_tokens` renders them capitalised in insertion
/// order for use in diagnostics.
#[derive(Debug, Clone)]
pub struct TokenTable<T> {
    entries: Vec<(String, T)>,
}

impl<T: Copy> TokenTable<T> {
    pub fn new<S: AsRef<str>>(entries: impl IntoIterator<Item = (S, T)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(token, value)| (token.as_ref().trim().to_lowercase(), value))
                .collect(),
        }
    }

    pub fn lookup(&self, raw: &str) -> Option<T> {
        let token = raw.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == token)
            .map(|(_, value)| *value)
    }

    pub fn accepted_tokens(&self) -> String {
        self.entries
            .iter()
            .map(|(token, _)| capitalize(token))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn parse(&self, raw: &str) -> Result<T, UnrecognizedToken> {
        self.lookup(raw).ok_or_else(|| UnrecognizedToken {
            token: raw.to_string(),
            accepted: self.accepted_tokens(),
        })
    }
}

impl Default for TokenTable<Gender> {
    fn default() -> Self {
        Self::new([
            ("male", Gender::Male),
            ("female", Gender::Female),
            ("m", Gender::Male),
            ("f", Gender::Female),
            ("boy", Gender::Male),
            ("girl", Gender::Female),
            ("b", Gender::Male),
            ("g", Gender::Female),
        ])
    }
}

impl Default for TokenTable<Day> {
    fn default() -> Self {
        Self::new([
            ("saturday", Day::Saturday),
            ("sunday", Day::Sunday),
            ("sat", Day::Saturday),
            ("sun", Day::Sunday),
        ])
    }
}

lazy_static! {
    static ref GENDER_TOKENS: TokenTable<Gender> = TokenTable::default();
    static ref DAY_TOKENS: TokenTable<Day> = TokenTable::default();
}

pub fn normalize_gender(raw: &str) -> Option<Gender> {
    GENDER_TOKENS.lookup(raw)
}

pub fn normalize_day(raw: &str) -> Option<Day> {
    DAY_TOKENS.lookup(raw)
}

impl std::str::FromStr for Gender {
    type Err = UnrecognizedToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GENDER_TOKENS.parse(s)
    }
}

impl std::str::FromStr for Day {
    type Err = UnrecognizedToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DAY_TOKENS.parse(s)
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trims and collapses runs of whitespace to a single space, keeping case.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased, whitespace-collapsed form used for duplicate comparison.
pub fn normalize_text(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_is_case_and_whitespace_insensitive() {
        assert_eq!(normalize_gender(" MALE "), Some(Gender::Male));
        assert_eq!(normalize_gender("male"), Some(Gender::Male));
        assert_eq!(normalize_gender("\tGirl\n"), Some(Gender::Female));
        assert_eq!(normalize_gender("F"), Some(Gender::Female));
        assert_eq!(normalize_gender("b"), Some(Gender::Male));
    }

    #[test]
    fn test_unknown_tokens_never_default() {
        assert_eq!(normalize_gender("other"), None);
        assert_eq!(normalize_gender(""), None);
        assert_eq!(normalize_gender("   "), None);
        assert_eq!(normalize_day("saturdays"), None);
        assert_eq!(normalize_day("mon"), None);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["m", "Girl", " FEMALE", "boy"] {
            let once = normalize_gender(raw).unwrap();
            assert_eq!(normalize_gender(once.as_str()), Some(once));
        }
        for raw in ["sat", "SUNDAY", " Sun "] {
            let once = normalize_day(raw).unwrap();
            assert_eq!(normalize_day(once.as_str()), Some(once));
        }
    }

    #[test]
    fn test_day_tokens() {
        assert_eq!(normalize_day("Sat"), Some(Day::Saturday));
        assert_eq!(normalize_day("sunday"), Some(Day::Sunday));
        assert_eq!("sun".parse::<Day>(), Ok(Day::Sunday));
    }

    #[test]
    fn test_accepted_tokens_for_diagnostics() {
        assert_eq!(
            TokenTable::<Gender>::default().accepted_tokens(),
            "Male/Female/M/F/Boy/Girl/B/G"
        );
        assert_eq!(
            TokenTable::<Day>::default().accepted_tokens(),
            "Saturday/Sunday/Sat/Sun"
        );
    }

    #[test]
    fn test_parse_error_carries_raw_token() {
        let err = "x".parse::<Gender>().unwrap_err();
        assert_eq!(err.token, "x");
        assert!(err.to_string().contains("Male/Female"));
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  John   DOE "), "john doe");
        assert_eq!(collapse_whitespace(" Dragon \t Dojo"), "Dragon Dojo");
    }
}
