use distress_core::domain::{AnalysisRecord, Collection};
use distress_core::notify::{Notification, NotificationKind, NotificationSink, TracingSink};

/// Prints notifications to stdout and also records them in the log, which
/// carries them to Sentry as breadcrumbs when it is configured.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    log: TracingSink,
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, n: Notification) {
        println!("{}", notification_line(&n));
        self.log.notify(n);
    }
}

fn notification_line(n: &Notification) -> String {
    let tag = match n.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Failure => "failed",
        NotificationKind::Info => "info",
    };
    format!("[{tag}] {}: {}", n.title, n.detail)
}

pub fn print_collection(collection: &Collection) {
    if collection.is_empty() {
        println!("No analyses stored.");
        return;
    }

    for record in collection {
        println!("{}", summary_line(record));
    }
}

fn summary_line(r: &AnalysisRecord) -> String {
    let periods = match &r.prior_period {
        Some(prior) => format!("{prior}..{}", r.current_period),
        None => r.current_period.clone(),
    };
    let stale = match r.data_quality.stale_years() {
        Some(years) if r.data_quality.is_stale => format!(" (stale by {years}y)"),
        _ if r.data_quality.is_stale => " (stale)".to_string(),
        _ => String::new(),
    };
    format!(
        "{}\tCIK {}\t{}\tscore {:.2}\t{}\t{}\t{}{}",
        r.symbol,
        r.company_id,
        periods,
        r.composite_score,
        r.grade,
        r.risk_level,
        r.recommendation,
        stale
    )
}
