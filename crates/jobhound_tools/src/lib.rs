//! External collaborators: ATS API clients, web search, page fetching.

pub mod ats;
pub mod browser;
pub mod search;

pub use ats::{
    ats_client_for, detect_ats, AtsClient, AtsClientFactory, AtsError, LiveAtsClientFactory,
};
pub use browser::{HttpPageFetcher, PageFetcher, ScrapeError};
pub use search::{CareerPageFinder, SearchProvider, SearchResult, TavilySearch};
