use crate::domain::record::AnalysisRecord;
use crate::domain::symbol::Symbol;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;

/// Insertion-ordered records with at most one record per symbol.
///
/// Serialized as a bare array. Deserializing goes through
/// [`Collection::from_records`], so repeated symbols are dropped there too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<AnalysisRecord>")]
pub struct Collection {
    records: Vec<AnalysisRecord>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from untrusted records, keeping the first record for
    /// each symbol. Returns the collection and the number of records dropped.
    pub fn from_records(records: Vec<AnalysisRecord>) -> (Self, usize) {
        let mut seen = HashSet::with_capacity(records.len());
        let total = records.len();
        let records: Vec<_> = records
            .into_iter()
            .filter(|r| seen.insert(r.symbol.clone()))
            .collect();
        let dropped = total - records.len();
        (Self { records }, dropped)
    }

    pub fn push(&mut self, record: AnalysisRecord) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.contains(&record.symbol),
            "collection already holds a record for {}",
            record.symbol
        );
        self.records.push(record);
        Ok(())
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.find(symbol).is_some()
    }

    pub fn find(&self, symbol: &Symbol) -> Option<&AnalysisRecord> {
        self.records.iter().find(|r| &r.symbol == symbol)
    }

    pub fn find_by_company_id(&self, company_id: &str) -> Option<&AnalysisRecord> {
        self.records.iter().find(|r| r.company_id == company_id)
    }

    pub fn symbols(&self) -> HashSet<&Symbol> {
        self.records.iter().map(|r| &r.symbol).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalysisRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<AnalysisRecord>> for Collection {
    fn from(records: Vec<AnalysisRecord>) -> Self {
        let (collection, dropped) = Self::from_records(records);
        if dropped > 0 {
            tracing::warn!(dropped, "dropped duplicate symbols while decoding collection");
        }
        collection
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a AnalysisRecord;
    type IntoIter = std::slice::Iter<'a, AnalysisRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::fixtures::{record, record_json};
    use serde_json::json;

    #[test]
    fn push_refuses_duplicate_symbol() {
        let mut c = Collection::new();
        c.push(record("AAPL")).unwrap();
        assert!(c.push(record("aapl")).is_err());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn from_records_keeps_first_occurrence_in_order() {
        let mut second_aapl = record("AAPL");
        second_aapl.grade = "F".to_string();

        let (c, dropped) =
            Collection::from_records(vec![record("AAPL"), record("MSFT"), second_aapl]);
        assert_eq!(dropped, 1);
        let symbols: Vec<_> = c.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(c.iter().next().unwrap().grade, "B");
    }

    #[test]
    fn lookup_by_company_id_is_separate_from_symbol() {
        let mut c = Collection::new();
        let rec = record("ORCL");
        let cik = rec.company_id.clone();
        c.push(rec).unwrap();

        assert_eq!(c.find_by_company_id(&cik).unwrap().symbol.as_str(), "ORCL");
        assert!(c.find_by_company_id("ORCL").is_none());
        assert!(c.contains(&Symbol::parse("orcl").unwrap()));
    }

    #[test]
    fn serializes_as_bare_array() {
        let mut c = Collection::new();
        c.push(record("NVDA")).unwrap();
        let v = serde_json::to_value(&c).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["ticker"], "NVDA");
    }

    #[test]
    fn decoding_drops_repeated_symbols() {
        let mut repeat = record_json("aapl", "0000320193");
        repeat["grade"] = json!("F");
        let raw = json!([
            record_json("AAPL", "0000320193"),
            repeat,
            record_json("MSFT", "0000789019"),
        ]);

        let c: Collection = serde_json::from_value(raw).unwrap();
        let symbols: Vec<_> = c.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(c.iter().next().unwrap().grade, "B");
    }
}
