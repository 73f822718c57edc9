pub mod directory;
pub mod places;

pub use directory::{BusinessDirectory, DirectoryQuery, HttpDirectoryClient};
pub use places::{DisabledPlacesClient, HttpPlacesClient, PlaceAutocomplete, PlaceMatch};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across clients to enable connection pooling.
pub fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Kompass/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}
