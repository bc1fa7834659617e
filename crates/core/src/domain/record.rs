use crate::domain::symbol::Symbol;
use serde::{Deserialize, Serialize};

/// One successful distress analysis for one company.
///
/// Field names on the wire (and in durable storage) follow the analysis
/// service's JSON, so a stored collection is exactly what the service returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "ticker")]
    pub symbol: Symbol,
    /// Registry identifier (SEC CIK). Display/lookup only, never a dedup key.
    #[serde(rename = "cik")]
    pub company_id: String,
    #[serde(rename = "current_year")]
    pub current_period: String,
    #[serde(rename = "prior_year", default)]
    pub prior_period: Option<String>,
    #[serde(rename = "score")]
    pub composite_score: f64,
    pub grade: String,
    pub risk_level: String,
    pub recommendation: String,
    pub alert_level: String,
    pub hold_position: bool,
    pub new_investment: bool,
    #[serde(rename = "metrics")]
    pub financial_metrics: FinancialMetrics,
    #[serde(rename = "financials")]
    pub financials_snapshot: FinancialsSnapshot,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub ohlson_o_score: f64,
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub debt_to_equity: f64,
    pub interest_coverage: f64,
    pub roa: f64,
    pub net_profit_margin: f64,
    pub operating_cf_ratio: f64,
    pub free_cf_to_assets: f64,
    // Growth needs a prior period.
    #[serde(default)]
    pub revenue_growth: Option<f64>,
    #[serde(default)]
    pub net_income_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialsSnapshot {
    pub total_assets: f64,
    pub revenue: f64,
    pub net_income: f64,
    pub operating_cash_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub is_stale: bool,
    #[serde(default)]
    pub filing_year: Option<i32>,
    pub data_year: i32,
}

impl DataQuality {
    /// Years between the filing and the fiscal year its data describes.
    pub fn stale_years(&self) -> Option<i32> {
        self.filing_year.map(|filing| filing - self.data_year)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::{json, Value};

    pub fn record_json(ticker: &str, cik: &str) -> Value {
        json!({
            "ticker": ticker,
            "cik": cik,
            "current_year": "FY2024",
            "prior_year": "FY2023",
            "score": 27.5,
            "grade": "B",
            "risk_level": "Low",
            "recommendation": "Buy",
            "alert_level": "Quarterly",
            "hold_position": true,
            "new_investment": true,
            "metrics": {
                "ohlson_o_score": -3.214,
                "current_ratio": 1.85,
                "quick_ratio": 1.42,
                "debt_to_equity": 0.61,
                "interest_coverage": 14.2,
                "roa": 0.12,
                "net_profit_margin": 0.181,
                "operating_cf_ratio": 0.95,
                "free_cf_to_assets": 0.087,
                "revenue_growth": 0.08,
                "net_income_growth": null
            },
            "financials": {
                "total_assets": 352_583_000_000.0,
                "revenue": 383_285_000_000.0,
                "net_income": 96_995_000_000.0,
                "operating_cash_flow": 110_543_000_000.0
            },
            "data_quality": {
                "is_stale": false,
                "filing_year": 2024,
                "data_year": 2024
            }
        })
    }

    pub fn record(ticker: &str) -> AnalysisRecord {
        let cik = format!("000{:07}", ticker.len() * 1111);
        serde_json::from_value(record_json(ticker, &cik)).unwrap()
    }
}
