//! CLI command handlers. Each command is in its own file.

mod completions;
mod exclusions;
mod filename;
mod scrape;
mod serve;

pub use completions::run_completions;
pub use exclusions::run_exclusions;
pub use filename::run_filename;
pub use scrape::run_scrape;
pub use serve::run_serve;
