//! Extractor collaborator contract and outcome classification

use crate::cache::{FetchFailure, Rejection, Resolution};
use crate::fetch::artifact::{Artifact, ContentType};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Raw content returned by a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorResponse {
    pub content: String,
    pub content_type: ContentType,
}

/// Category of an extraction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorErrorKind {
    /// The backend refused because a specialized extractor owns the URL
    Conflict,
    /// Transport-level problem (refused connection, reset, 5xx, rate limit)
    Network,
    /// The backend answered, but not with usable content
    Malformed,
}

impl fmt::Display for ExtractorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conflict => "conflict",
            Self::Network => "network",
            Self::Malformed => "malformed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct ExtractorError {
    pub kind: ExtractorErrorKind,
    pub message: String,
}

impl ExtractorError {
    pub fn new(kind: ExtractorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ExtractorErrorKind::Conflict, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ExtractorErrorKind::Network, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ExtractorErrorKind::Malformed, message)
    }
}

/// Performs one extraction against a checked-out session handle
#[async_trait]
pub trait Extractor<H: Send>: Send + Sync + 'static {
    async fn extract(&self, session: &mut H, url: &Url)
        -> Result<ExtractorResponse, ExtractorError>;
}

/// What an extraction outcome means for the cache
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Success(Artifact),
    RecoverableFailure(String),
    FatalFailure(String),
    SpecializedExists,
}

impl Classification {
    pub fn into_resolution(self) -> Resolution {
        match self {
            Self::Success(artifact) => Resolution::Ready(Arc::new(artifact)),
            Self::RecoverableFailure(reason) => {
                Resolution::Failed(FetchFailure::Recoverable(reason))
            }
            Self::FatalFailure(reason) => Resolution::Failed(FetchFailure::Fatal(reason)),
            Self::SpecializedExists => Resolution::Rejected(Rejection::SpecializedExists),
        }
    }
}

/// Maps a raw extractor outcome to a [`Classification`]
///
/// | Outcome | Classification |
/// |---------|----------------|
/// | content present | Success |
/// | empty or whitespace-only content | FatalFailure |
/// | `Network` error | RecoverableFailure |
/// | `Malformed` error | FatalFailure |
/// | `Conflict` error | SpecializedExists |
pub fn classify(url: &Url, outcome: Result<ExtractorResponse, ExtractorError>) -> Classification {
    match outcome {
        Ok(response) if response.content.trim().is_empty() => {
            Classification::FatalFailure("extractor returned empty content".to_string())
        }
        Ok(response) => Classification::Success(Artifact::new(
            url.as_str(),
            response.content,
            response.content_type,
        )),
        Err(e) => match e.kind {
            ExtractorErrorKind::Conflict => Classification::SpecializedExists,
            ExtractorErrorKind::Network => Classification::RecoverableFailure(e.message),
            ExtractorErrorKind::Malformed => Classification::FatalFailure(e.message),
        },
    }
}
