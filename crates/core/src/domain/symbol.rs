use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical ticker identifier: trimmed, upper-cased, never empty.
///
/// Equality on `Symbol` is the case-insensitive identity used for
/// de-duplication, because every constructor canonicalizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        Some(Self(s.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "ticker must be non-empty".to_string())
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Splits comma-separated user input into canonical symbols, in order of
/// appearance. Repeats are kept; de-duplication happens later.
pub fn normalize(raw_text: &str) -> Vec<Symbol> {
    raw_text.split(',').filter_map(Symbol::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(Symbol::as_str).collect()
    }

    #[test]
    fn normalize_trims_uppercases_and_keeps_order() {
        let out = normalize(" nvda, Orcl ,aapl");
        assert_eq!(strs(&out), vec!["NVDA", "ORCL", "AAPL"]);
    }

    #[test]
    fn normalize_keeps_repeats_for_the_deduplicator() {
        let out = normalize("nvda, NVDA, Nvda");
        assert_eq!(strs(&out), vec!["NVDA", "NVDA", "NVDA"]);
    }

    #[test]
    fn normalize_drops_empty_pieces() {
        assert!(normalize("").is_empty());
        assert!(normalize(" , , ").is_empty());
        assert_eq!(strs(&normalize(",msft,,")), vec!["MSFT"]);
    }

    #[test]
    fn deserialize_canonicalizes_and_rejects_blank() {
        let s: Symbol = serde_json::from_str("\" brk.b \"").unwrap();
        assert_eq!(s.as_str(), "BRK.B");
        assert!(serde_json::from_str::<Symbol>("\"   \"").is_err());
    }
}
