//! Fetch module
//!
//! Turns a URL into an [`Artifact`]: routing, cache consultation, session
//! checkout, extraction and classification.

mod artifact;
mod extractor;
mod http;
mod orchestrator;

pub use artifact::{Artifact, ContentType};
pub use extractor::{
    classify, Classification, Extractor, ExtractorError, ExtractorErrorKind, ExtractorResponse,
};
pub use http::{
    build_http_client, DirectExtractor, HttpExtractor, HttpSessionFactory, ServiceExtractor,
};
pub use orchestrator::{FetchSettings, Orchestrator, ResolveOptions};
