use crate::domain::{Collection, Symbol};
use std::collections::HashSet;

/// Symbols from `candidates` that are neither already in `existing` nor
/// repeated earlier in `candidates`. First occurrence wins; order is kept.
pub fn select_new(candidates: &[Symbol], existing: &Collection) -> Vec<Symbol> {
    let known = existing.symbols();
    let mut kept = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter(|s| !known.contains(s) && kept.insert(*s))
        .cloned()
        .collect()
}

/// `candidates` with repeats removed, first occurrence wins.
pub fn unique(candidates: &[Symbol]) -> Vec<Symbol> {
    select_new(candidates, &Collection::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize;
    use crate::domain::record::fixtures::record;

    fn strs(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(Symbol::as_str).collect()
    }

    #[test]
    fn removes_intra_batch_repeats_in_any_case() {
        let out = select_new(&normalize("nvda, NVDA, Nvda, orcl, nvda"), &Collection::new());
        assert_eq!(strs(&out), vec!["NVDA", "ORCL"]);
    }

    #[test]
    fn removes_symbols_already_in_collection() {
        let mut existing = Collection::new();
        existing.push(record("AAPL")).unwrap();

        let out = select_new(&normalize("aapl, msft, AAPL"), &existing);
        assert_eq!(strs(&out), vec!["MSFT"]);
    }

    #[test]
    fn empty_when_everything_is_known() {
        let mut existing = Collection::new();
        existing.push(record("AAPL")).unwrap();
        assert!(select_new(&normalize("Aapl,aapl"), &existing).is_empty());
    }
}
