pub mod collection;
pub mod contract;
pub mod record;
pub mod symbol;

pub use collection::Collection;
pub use record::AnalysisRecord;
pub use symbol::{normalize, Symbol};
