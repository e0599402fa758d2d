//! Analysis service: validate a feature payload, persist it, ask the
//! classifier and persist the verdict.
//!
//! Persistence is best effort. A store failure is logged and the verdict is
//! still returned; classifier failures never reach this layer.

use crate::error::GateError;
use crate::features::FeatureVector;
use crate::risk::{Classifier, RiskDecision};
use crate::storage::SessionStore;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Session record id; absent when no store is configured or the insert failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(flatten)]
    pub decision: RiskDecision,
}

pub struct AnalysisService<C> {
    classifier: C,
    store: Option<Arc<SessionStore>>,
}

impl<C: Classifier> AnalysisService<C> {
    pub fn new(classifier: C, store: Option<Arc<SessionStore>>) -> Self {
        Self { classifier, store }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn store(&self) -> Option<&Arc<SessionStore>> {
        self.store.as_ref()
    }

    /// Entry point for untrusted JSON. Rejects before anything is stored.
    pub async fn analyze_payload(&self, payload: &Value) -> Result<Analysis, GateError> {
        let features = FeatureVector::from_payload(payload).map_err(|e| {
            warn!(error = %e, "rejected feature payload");
            e
        })?;
        Ok(self.analyze(&features).await)
    }

    pub async fn analyze(&self, features: &FeatureVector) -> Analysis {
        let record_id = self.store.as_ref().and_then(|s| match s.create_record(features) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(user_id = %features.user_id, error = %e, "session record not created");
                None
            }
        });

        let decision = self.classifier.evaluate(features).await;

        if let (Some(store), Some(id)) = (self.store.as_ref(), record_id.as_deref()) {
            if let Err(e) = store.record_decision(id, &decision) {
                warn!(record_id = id, error = %e, "verdict not persisted");
            }
        }

        info!(
            user_id = %features.user_id,
            record_id = record_id.as_deref().unwrap_or("-"),
            decision = %decision.decision,
            score = decision.final_risk_score,
            fallback = decision.is_fallback(),
            "session analysed"
        );
        Analysis { record_id, decision }
    }

    /// Record a challenge-verified admission. No-op without a store.
    pub fn mark_verified(&self, record_id: &str) -> Result<(), GateError> {
        if let Some(store) = self.store.as_ref() {
            store.mark_verified(record_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::risk::Decision;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        decision: Decision,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for Fixed {
        async fn evaluate(&self, _features: &FeatureVector) -> RiskDecision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RiskDecision {
                final_risk_score: 12.5,
                attack_intensity: 0.2,
                user_trust: 7.0,
                decision: self.decision,
                reason: None,
                raw_bot_prob: Some(0.1),
                remapped_prob: None,
            }
        }
    }

    fn fixed(decision: Decision) -> Fixed {
        Fixed {
            decision,
            calls: AtomicUsize::new(0),
        }
    }

    fn payload() -> Value {
        let mut v = serde_json::to_value(FeatureVector::default()).unwrap();
        v["user_id"] = json!("alice");
        v["sessionDuration"] = json!(12.5);
        v
    }

    #[tokio::test]
    async fn valid_payload_is_stored_and_updated() {
        let store = Arc::new(SessionStore::open_in_memory(b"k").unwrap());
        let svc = AnalysisService::new(fixed(Decision::HardCaptcha), Some(Arc::clone(&store)));
        let a = svc.analyze_payload(&payload()).await.unwrap();
        assert_eq!(a.decision.decision, Decision::HardCaptcha);

        let rec = store.get_record(a.record_id.as_deref().unwrap()).unwrap().unwrap();
        assert_eq!(rec.user_id, "alice");
        assert_eq!(rec.features.session_duration, 12.5);
        assert_eq!(rec.decision.as_deref(), Some("HARD_CAPTCHA"));
        assert_eq!(rec.final_risk_score, Some(12.5));
        assert!(!rec.verified_via_challenge);

        svc.mark_verified(&rec.id).unwrap();
        let rec = store.get_record(&rec.id).unwrap().unwrap();
        assert_eq!(rec.decision.as_deref(), Some("ALLOW"));
        assert!(rec.verified_via_challenge);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_classifier() {
        let svc = AnalysisService::new(fixed(Decision::Allow), None);
        let mut bad = payload();
        bad.as_object_mut().unwrap().remove("burstScore");
        assert!(matches!(
            svc.analyze_payload(&bad).await,
            Err(GateError::Validation(_))
        ));
        assert!(matches!(
            svc.analyze_payload(&json!([1, 2])).await,
            Err(GateError::Validation(_))
        ));

        // a camelCase alias does not stand in for the wire name
        let mut renamed = payload();
        let obj = renamed.as_object_mut().unwrap();
        let user = obj.remove("user_id").unwrap();
        obj.insert("userId".into(), user);
        assert!(matches!(
            svc.analyze_payload(&renamed).await,
            Err(GateError::Validation(ValidationError::MissingField("user_id")))
        ));
        assert_eq!(svc.classifier().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn works_without_a_store() {
        let svc = AnalysisService::new(fixed(Decision::Allow), None);
        let a = svc.analyze(&FeatureVector::default()).await;
        assert!(a.record_id.is_none());
        assert!(svc.mark_verified("missing").is_ok());
    }
}
