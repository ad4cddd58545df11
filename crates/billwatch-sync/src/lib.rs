//! Bill providers: fetch, normalize, and filter records from the LegiScan API,
//! OpenStates, LegiScan dataset archives, and the leginfo search page.

mod error;
mod html;
mod http;
pub mod normalize;
pub mod sources;
mod text;
mod window;

pub use error::SourceError;
pub use html::extract_bill_text;
pub use http::HttpClient;
pub use sources::{
    BillSource, DatasetSource, Fetcher, LegiScanSource, LeginfoSource, OpenStatesSource,
};
pub use text::BillTextFetcher;
pub use window::FetchWindow;
