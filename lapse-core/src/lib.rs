pub mod config;
pub mod expiry;
pub mod hunt;
pub mod report;
pub mod seo;

pub use config::{HuntConfig, LookupStrategy};
pub use expiry::{ExpiryChecker, LookupOutcome, UnknownPolicy};
pub use hunt::{HuntHooks, HuntSummary, run_hunt};
pub use report::{EnrichedDomain, ExpiredDomain};
