pub mod config;
pub mod logging;

pub mod coordinator;
pub mod exclusions;
pub mod filename;
pub mod metadata;
pub mod page;
pub mod poll;
pub mod protocol;
