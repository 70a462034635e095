pub mod encoding;
pub mod structured;
pub mod tabular;

pub use encoding::{read_listing, TextEncoding};
pub use structured::parse_structured_listing;
pub use tabular::{parse_tabular_listing, TabularListing, TabularRules};
