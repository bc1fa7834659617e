pub mod analysis;
pub mod batch;
pub mod domain;
pub mod notify;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_ANALYSIS_BASE_URL: &str = "http://localhost:8000";
    pub const DEFAULT_STORE_PATH: &str = "analyzedCompanies.json";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub analysis_base_url: Option<String>,
        pub analysis_timeout_secs: Option<u64>,
        pub analysis_req_delay_ms: Option<u64>,
        pub store_path: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                analysis_base_url: non_blank_var("ANALYSIS_BASE_URL"),
                analysis_timeout_secs: parse_var("ANALYSIS_TIMEOUT_SECS")?,
                analysis_req_delay_ms: parse_var("ANALYSIS_REQ_DELAY_MS")?,
                store_path: non_blank_var("DISTRESS_STORE_PATH"),
                sentry_dsn: non_blank_var("SENTRY_DSN"),
            })
        }

        pub fn analysis_base_url(&self) -> &str {
            self.analysis_base_url
                .as_deref()
                .unwrap_or(DEFAULT_ANALYSIS_BASE_URL)
        }

        pub fn analysis_timeout(&self) -> Duration {
            Duration::from_secs(self.analysis_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
        }

        pub fn dispatch_delay(&self) -> Duration {
            Duration::from_millis(self.analysis_req_delay_ms.unwrap_or(0))
        }

        pub fn store_path(&self) -> &str {
            self.store_path.as_deref().unwrap_or(DEFAULT_STORE_PATH)
        }
    }

    fn non_blank_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parse_var(key: &str) -> anyhow::Result<Option<u64>> {
        non_blank_var(key)
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a non-negative integer (got {s:?})"))
            })
            .transpose()
    }

}
