pub mod client;
pub mod google;
pub mod synth;

pub mod mock;

pub use client::HttpSource;
pub use google::PlacesSource;
pub use mock::{MockResponse, MockSource, StaticSource};

use std::time::Duration;

/// Timeout applied to every outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent("SchoolFinder/1.0")
        .build()
        .unwrap_or_default()
}

/// Map a transport-level reqwest failure. The request URL is dropped from
/// the message because it can carry an API key.
fn transport_error(e: reqwest::Error) -> schoolfinder_core::SourceError {
    use schoolfinder_core::SourceError;
    let e = e.without_url();
    if e.is_decode() {
        SourceError::Malformed(e.to_string())
    } else {
        SourceError::Unavailable(e.to_string())
    }
}
