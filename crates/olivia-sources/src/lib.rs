//! OLIVIA Sources
//!
//! Uniform retrieval over the French legal-data providers:
//! - Légifrance (legislation) and Judilibre (case law), queried per harm category
//! - Justice Back (judicial-service locations), queried per postal code
//! - An offline fixture source for demo mode and tests
//!
//! Every adapter normalizes its provider's response into `ExternalRecord`
//! at the boundary and reports failures as `SourceError` kinds.

pub mod adapter;
pub mod fixture;
pub mod http;
pub mod judilibre;
pub mod justice_back;
pub mod legifrance;
pub mod normalize;
pub mod oauth;
pub mod registry;
pub mod settings;

pub use adapter::{FetchOutcome, SourceAdapter, SourceQuery};
pub use fixture::FixtureAdapter;
pub use http::{ApiClient, Auth, RetryPolicy};
pub use judilibre::JudilibreAdapter;
pub use justice_back::{is_valid_postal_code, JusticeBackAdapter};
pub use legifrance::LegifranceAdapter;
pub use oauth::{OAuthCredentials, TokenProvider};
pub use registry::SourceRegistry;
pub use settings::{SourceSettings, SourcesSettings};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapter::{FetchOutcome, SourceAdapter, SourceQuery};
    pub use crate::fixture::FixtureAdapter;
    pub use crate::registry::SourceRegistry;
    pub use crate::settings::{SourceSettings, SourcesSettings};
}
