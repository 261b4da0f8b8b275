//! Page agent: everything that runs against the visited movie page.
//!
//! The page is reached only through the [`PageDom`] trait, so the same
//! extraction and orchestration code drives a saved HTML page ([`StaticPage`])
//! or any live browser binding that implements the trait.

mod agent;
mod dom;
mod extract;
mod resolve;
mod selectors;
mod static_dom;

pub use agent::{
    is_movie_detail_url, AgentSettings, ClickOutcome, CoordinatorClient, InProcessClient,
    PageAgent, ProcessingGuard, ProcessingLock, RunOutcome, SkipReason,
};
pub use dom::{Element, NodeKey, PageDom};
pub use extract::{
    clean_title, extract_actors, extract_date, extract_network, extract_title,
    is_placeholder_title,
};
pub use resolve::{resolve_video_source, url_from_option, VideoSource};
pub use selectors::{QualityOrder, SiteSelectors};
pub use static_dom::StaticPage;
