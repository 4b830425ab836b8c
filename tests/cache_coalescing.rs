//! Concurrent generation requests share one generator call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nelie_planner::cache::{RequestFingerprint, ResponseCache};
use nelie_planner::config::PlannerConfig;
use nelie_planner::error::GenerationError;
use nelie_planner::generation::{ActivityGenerator, GenerationRequest, GenerationService};
use nelie_planner::subject::SubjectKey;

struct CountingGenerator {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ActivityGenerator for CountingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(format!(
            r#"[{{"kind": "mcq", "question": "About {}", "options": ["a", "b", "c"],
                 "correctIndex": 2, "hints": ["Look again"], "estimatedTimeMin": 10}}]"#,
            request.topic
        ))
    }
}

#[tokio::test]
async fn test_identical_concurrent_requests_coalesce() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = GenerationService::new(
        CountingGenerator {
            calls: Arc::clone(&calls),
        },
        &PlannerConfig::default(),
    );
    let request = GenerationRequest::new(SubjectKey::Science, "volcanoes", 30);

    let (a, b, c) = tokio::join!(
        service.generate(&request),
        service.generate(&request),
        service.generate(&request),
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.activities[0].estimated_time_min, 30.0);
}

#[tokio::test]
async fn test_distinct_requests_do_not_coalesce() {
    let calls = Arc::new(AtomicUsize::new(0));
    let service = GenerationService::new(
        CountingGenerator {
            calls: Arc::clone(&calls),
        },
        &PlannerConfig::default(),
    );
    let volcanoes = GenerationRequest::new(SubjectKey::Science, "volcanoes", 30);
    let rivers = GenerationRequest::new(SubjectKey::GlobalGeography, "rivers", 30);

    let (a, b) = tokio::join!(service.generate(&volcanoes), service.generate(&rivers));

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_ne!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn test_shared_cache_across_tasks() {
    let cache: Arc<ResponseCache<u64, String>> = Arc::new(ResponseCache::new(16));
    let calls = Arc::new(AtomicUsize::new(0));
    let key = RequestFingerprint::from_content("lesson-42");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_fetch(&key, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(42)
                })
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(42));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}
