//! AI activity generation.
//!
//! The language model sits behind [`ActivityGenerator`]. [`GenerationService`]
//! wraps a generator with response caching, JSON extraction and activity
//! validation, so callers always receive normalized activities.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::activity::{extract_activity_payload, ActivityValidator, ValidatedActivities};
use crate::cache::{CacheStats, RequestFingerprint, ResponseCache};
use crate::config::PlannerConfig;
use crate::error::GenerationError;
use crate::subject::SubjectKey;

/// Default timeout for a single generator call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// What to ask the content generator for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub subject: SubjectKey,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    pub activity_count: usize,
    pub target_minutes: u32,
    /// Activity kinds the lesson should mix, e.g. `mcq`, `open`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
}

impl GenerationRequest {
    pub fn new(subject: SubjectKey, topic: impl Into<String>, target_minutes: u32) -> Self {
        Self {
            subject,
            topic: topic.into(),
            grade_level: None,
            activity_count: 5,
            target_minutes,
            kinds: Vec::new(),
        }
    }

    pub fn with_grade_level(mut self, grade: impl Into<String>) -> Self {
        self.grade_level = Some(grade.into());
        self
    }

    pub fn with_activity_count(mut self, count: usize) -> Self {
        self.activity_count = count;
        self
    }

    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn fingerprint(&self) -> Result<RequestFingerprint, GenerationError> {
        RequestFingerprint::of(self).map_err(|e| GenerationError::InvalidRequest(e.to_string()))
    }
}

/// A source of raw activity text, typically a language model.
#[async_trait]
pub trait ActivityGenerator: Send + Sync {
    /// Returns the model's raw reply for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Generates, validates and caches activities.
pub struct GenerationService<G> {
    generator: Arc<G>,
    validator: ActivityValidator,
    cache: ResponseCache<ValidatedActivities, GenerationError>,
    timeout: Duration,
}

impl<G> GenerationService<G>
where
    G: ActivityGenerator + 'static,
{
    pub fn new(generator: G, config: &PlannerConfig) -> Self {
        Self {
            generator: Arc::new(generator),
            validator: ActivityValidator::from_config(config),
            cache: ResponseCache::new(config.response_cache_capacity),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns validated activities for `request`, from cache when possible.
    ///
    /// Identical concurrent requests share one generator call. Failed calls
    /// are not cached. A result with few or no activities is still `Ok`;
    /// check [`ValidationReport::is_sparse`](crate::activity::ValidationReport::is_sparse).
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the generator fails or times out, or
    /// when its reply holds no usable JSON.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ValidatedActivities, GenerationError> {
        let fingerprint = request.fingerprint()?;
        let generator = Arc::clone(&self.generator);
        let validator = self.validator;
        let timeout = self.timeout;
        let owned = request.clone();

        let result = self
            .cache
            .get_or_fetch(&fingerprint, move || async move {
                fetch_activities(generator.as_ref(), &owned, validator, timeout).await
            })
            .await?;

        if result.report.is_sparse(request.activity_count) {
            tracing::info!(
                fingerprint = %fingerprint.short(),
                requested = request.activity_count,
                retained = result.report.retained_count,
                "generated activity set is sparse"
            );
        }
        Ok(result)
    }

    /// Drops any cached result for `request` and generates again.
    pub async fn regenerate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ValidatedActivities, GenerationError> {
        self.cache.invalidate(&request.fingerprint()?);
        self.generate(request).await
    }
}

async fn fetch_activities<G: ActivityGenerator + ?Sized>(
    generator: &G,
    request: &GenerationRequest,
    validator: ActivityValidator,
    timeout: Duration,
) -> Result<ValidatedActivities, GenerationError> {
    let raw = tokio::time::timeout(timeout, generator.generate(request))
        .await
        .map_err(|_| GenerationError::Timeout {
            millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })??;

    let payload = extract_activity_payload(&raw)?;
    let validated = validator.validate_value(&payload, request.target_minutes);

    tracing::debug!(
        subject = %request.subject,
        retained = validated.report.retained_count,
        dropped = validated.report.dropped_count(),
        "validated generated activities"
    );
    Ok(validated)
}
