pub mod fetcher;
pub mod site;

pub use fetcher::{HttpFetcher, PageFetcher};
pub use site::{SiteVerifier, VerificationOutcome, VerificationReport};
