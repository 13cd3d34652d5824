// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    hunt_config_from_args, load_domains_from_file, load_urls_from_file, load_urls_from_source,
    parse_url_line, resolve_api_key,
};

// Re-export the hunt pipeline from lapse-core
pub use lapse_core::{HuntConfig, HuntHooks, HuntSummary, run_hunt};
