use crate::domain::record::AnalysisRecord;
use crate::domain::symbol::Symbol;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

pub const REJECTED_FALLBACK_REASON: &str =
    "Required financial data not available in 10-K filing.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub ticker: String,
}

impl AnalyzeRequest {
    pub fn for_symbol(symbol: &Symbol) -> Self {
        Self {
            ticker: symbol.to_string(),
        }
    }
}

/// Error body the service sends with 4xx statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn reason_or_fallback(self) -> String {
        self.detail
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| REJECTED_FALLBACK_REASON.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyzeResponse(pub AnalysisRecord);

impl AnalyzeResponse {
    pub fn validate_and_into_record(self, expected: &Symbol) -> anyhow::Result<AnalysisRecord> {
        let record = self.0;

        ensure!(
            &record.symbol == expected,
            "service answered for {} when {expected} was requested",
            record.symbol
        );
        ensure!(
            record.composite_score.is_finite() && (0.0..=100.0).contains(&record.composite_score),
            "score must be between 0 and 100 (got {})",
            record.composite_score
        );
        ensure!(!record.company_id.trim().is_empty(), "cik must be non-empty");
        ensure!(!record.grade.trim().is_empty(), "grade must be non-empty");
        ensure!(
            !record.current_period.trim().is_empty(),
            "current_year must be non-empty"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::fixtures::record_json;

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[test]
    fn accepts_matching_lowercase_ticker() {
        let resp: AnalyzeResponse =
            serde_json::from_value(record_json("nvda", "0001045810")).unwrap();
        let rec = resp.validate_and_into_record(&sym("NVDA")).unwrap();
        assert_eq!(rec.symbol, sym("NVDA"));
    }

    #[test]
    fn rejects_mismatched_ticker() {
        let resp: AnalyzeResponse =
            serde_json::from_value(record_json("MSFT", "0000789019")).unwrap();
        assert!(resp.validate_and_into_record(&sym("AAPL")).is_err());
    }

    #[test]
    fn rejects_out_of_range_score() {
        let mut v = record_json("AAPL", "0000320193");
        v["score"] = serde_json::json!(140.0);
        let resp: AnalyzeResponse = serde_json::from_value(v).unwrap();
        assert!(resp.validate_and_into_record(&sym("AAPL")).is_err());
    }

    #[test]
    fn error_body_falls_back_on_blank_detail() {
        let blank: ErrorBody = serde_json::from_str(r#"{"detail": "  "}"#).unwrap();
        assert_eq!(blank.reason_or_fallback(), REJECTED_FALLBACK_REASON);

        let missing: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.reason_or_fallback(), REJECTED_FALLBACK_REASON);

        let given: ErrorBody =
            serde_json::from_str(r#"{"detail": "Bank filings lack current assets"}"#).unwrap();
        assert_eq!(given.reason_or_fallback(), "Bank filings lack current assets");
    }
}
