pub mod bill;
pub mod bill_number;
pub mod config;
pub mod merge;
pub mod retry;
pub mod screening;
pub mod selection;

pub use bill::{Action, Analysis, BillRecord, Criterion, Hearing, Severity};
pub use bill_number::{bill_sort_key, normalize_bill_number};
pub use config::{Config, ConfigError};
pub use merge::{BillMap, ChangedBill, MergeOutcome, merge};
pub use retry::{RetryPolicy, Retryable};
pub use screening::{ScreeningMode, bills_needing_analysis};
pub use selection::{Digest, DigestLimits, select_bills};
