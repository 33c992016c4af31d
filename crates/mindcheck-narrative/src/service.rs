//! The narrative requestor: one call, failures absorbed into the result.

use async_trait::async_trait;
use mindcheck_core::NarrativeResult;
use tracing::warn;

use crate::http::NarrativeError;
use crate::request::NarrativeRequest;

/// A text-generation backend.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}

/// Issue `request` exactly once. Never fails: transport errors, non-success
/// statuses and empty completions all come back as a failed `NarrativeResult`.
pub async fn request_narrative(
    service: &dyn NarrativeService,
    request: &NarrativeRequest,
) -> NarrativeResult {
    match service.generate(request).await {
        Ok(text) if !text.trim().is_empty() => NarrativeResult::success(text.trim()),
        Ok(_) => {
            warn!("narrative service returned blank text");
            NarrativeResult::failure(NarrativeError::EmptyContent.to_string())
        }
        Err(e) => {
            warn!(error = %e, "narrative request failed");
            NarrativeResult::failure(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: fn() -> Result<String, NarrativeError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NarrativeService for Scripted {
        async fn generate(&self, _: &NarrativeRequest) -> Result<String, NarrativeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    fn request() -> NarrativeRequest {
        NarrativeRequest {
            model: "m".into(),
            messages: vec![],
            max_tokens: 1,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn success_is_trimmed() {
        let svc = Scripted {
            reply: || Ok("  Depression Probability: 40%\n".into()),
            calls: AtomicUsize::new(0),
        };
        let result = request_narrative(&svc, &request()).await;
        assert_eq!(result, NarrativeResult::success("Depression Probability: 40%"));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_is_absorbed_after_one_attempt() {
        let svc = Scripted {
            reply: || {
                Err(NarrativeError::Server {
                    status: 503,
                    body: "overloaded".into(),
                })
            },
            calls: AtomicUsize::new(0),
        };
        let result = request_narrative(&svc, &request()).await;
        assert!(result.is_degraded());
        assert!(result.error.as_deref().unwrap().contains("503"));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_text_is_a_failure() {
        let svc = Scripted {
            reply: || Ok(" \n ".into()),
            calls: AtomicUsize::new(0),
        };
        let result = request_narrative(&svc, &request()).await;
        assert!(result.is_degraded());
        assert_eq!(result.usable_text(), None);
    }
}
