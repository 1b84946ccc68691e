use async_trait::async_trait;
use course_core::model::{
    CourseId, Section, SectionId, UserProgression, UserProgressionPartial, XpPeriod, XpSnapshot,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by backend gateways.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("not found")]
    NotFound,

    #[error("request failed with status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("backend unavailable")]
    Unavailable,
}

impl RemoteError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Timeout | RemoteError::Network(_) | RemoteError::Unavailable => true,
            RemoteError::Status(code) => *code >= 500 || *code == 429,
            RemoteError::NotFound | RemoteError::Decode(_) => false,
        }
    }
}

/// Body of a successful section completion.
///
/// Both parts are optional on the wire; the progression part may be partial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionCompletion {
    pub progression: Option<UserProgressionPartial>,
    pub section: Option<Section>,
}

/// `POST /sections/{id}/complete`
#[async_trait]
pub trait SectionGateway: Send + Sync {
    /// Mark a section completed and award its XP.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the backend rejects or cannot be reached.
    async fn complete_section(&self, section_id: &SectionId)
    -> Result<SectionCompletion, RemoteError>;
}

/// `GET /profile/progression`
#[async_trait]
pub trait ProgressionGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` if the backend rejects or cannot be reached.
    async fn fetch_progression(&self) -> Result<UserProgression, RemoteError>;
}

/// Activity feed writes. Callers treat these as best-effort.
#[async_trait]
pub trait ActivityGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` if the backend rejects or cannot be reached.
    async fn record_level_up(&self, level: u32) -> Result<(), RemoteError>;

    /// # Errors
    ///
    /// Returns `RemoteError` if the backend rejects or cannot be reached.
    async fn record_section_completion(
        &self,
        course_id: &CourseId,
        section_id: &SectionId,
        xp_earned: u32,
    ) -> Result<(), RemoteError>;
}

/// `GET /activity/xp-history`
#[async_trait]
pub trait XpHistoryGateway: Send + Sync {
    /// Snapshots in no particular order; may be empty.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the backend rejects or cannot be reached.
    async fn fetch_xp_history(
        &self,
        period: XpPeriod,
        limit: usize,
    ) -> Result<Vec<XpSnapshot>, RemoteError>;
}

/// Aggregates the backend gateways behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Remote {
    pub sections: Arc<dyn SectionGateway>,
    pub progression: Arc<dyn ProgressionGateway>,
    pub activity: Arc<dyn ActivityGateway>,
    pub xp_history: Arc<dyn XpHistoryGateway>,
}

impl Remote {
    /// Build a `Remote` whose gateways all share one in-memory backend.
    #[must_use]
    pub fn in_memory(backend: crate::memory::InMemoryBackend) -> Self {
        Self {
            sections: Arc::new(backend.clone()),
            progression: Arc::new(backend.clone()),
            activity: Arc::new(backend.clone()),
            xp_history: Arc::new(backend),
        }
    }
}
