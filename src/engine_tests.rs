// Integration tests for the analysis engine
// These tests drive full analyze -> diagnose -> feedback -> re-analyze
// flows against scripted classifiers and the in-memory store

#[cfg(test)]
mod tests {
    use crate::classifier::{ClassifierError, ClassifierVerdict, LeafClassifier, LeafImage};
    use crate::config::AdvisorConfig;
    use crate::engine::{AdvisorEngine, AnalysisError, AnalysisOutcome, FeedbackAck};
    use crate::gate::RejectReason;
    use crate::store::{KvStore, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Classifier returning the same verdict on every call
    struct FixedClassifier {
        verdict: ClassifierVerdict,
    }

    impl FixedClassifier {
        fn new(label: &str, confidence: f64) -> Self {
            Self {
                verdict: ClassifierVerdict::new(label, confidence),
            }
        }
    }

    #[async_trait]
    impl LeafClassifier for FixedClassifier {
        async fn classify(&self, _image: &LeafImage) -> Result<ClassifierVerdict, ClassifierError> {
            Ok(self.verdict.clone())
        }
    }

    /// Classifier that always fails at the transport level
    struct FailingClassifier;

    #[async_trait]
    impl LeafClassifier for FailingClassifier {
        async fn classify(&self, _image: &LeafImage) -> Result<ClassifierVerdict, ClassifierError> {
            Err(ClassifierError::Unreachable("connection refused".to_string()))
        }
    }

    /// Classifier that blocks until released, for in-flight tests
    struct BlockingClassifier {
        release: Arc<Notify>,
        verdict: ClassifierVerdict,
    }

    #[async_trait]
    impl LeafClassifier for BlockingClassifier {
        async fn classify(&self, _image: &LeafImage) -> Result<ClassifierVerdict, ClassifierError> {
            self.release.notified().await;
            Ok(self.verdict.clone())
        }
    }

    fn engine_with(classifier: Arc<dyn LeafClassifier>) -> AdvisorEngine {
        AdvisorEngine::new(
            AdvisorConfig::default(),
            classifier,
            Arc::new(MemoryStore::new()),
        )
    }

    fn image() -> LeafImage {
        LeafImage::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    #[tokio::test]
    async fn test_healthy_flow() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___healthy", 0.95)));
        let outcome = engine.analyze(&image()).await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Healthy));

        let counters = engine.counters();
        assert_eq!(counters.analyzed, 1);
        assert_eq!(counters.healthy, 1);
        assert_eq!(counters.diseased, 0);
    }

    #[tokio::test]
    async fn test_not_a_leaf_flow() {
        let engine = engine_with(Arc::new(FixedClassifier::new("background_noise", 0.99)));
        let outcome = engine.analyze(&image()).await.unwrap();
        assert!(matches!(
            outcome,
            AnalysisOutcome::Rejected {
                reason: RejectReason::NotALeaf
            }
        ));

        // Rejected-as-not-a-leaf still consumed a classification call
        let counters = engine.counters();
        assert_eq!(counters.analyzed, 1);
        assert_eq!(counters.healthy, 0);
        assert_eq!(counters.diseased, 0);
    }

    #[tokio::test]
    async fn test_low_confidence_flow() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.65)));
        let outcome = engine.analyze(&image()).await.unwrap();
        assert!(matches!(
            outcome,
            AnalysisOutcome::Rejected {
                reason: RejectReason::LowConfidence
            }
        ));
        assert_eq!(engine.counters().analyzed, 1);
        assert_eq!(engine.counters().diseased, 0);
    }

    #[tokio::test]
    async fn test_diagnosis_flow() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)));
        let outcome = engine.analyze(&image()).await.unwrap();

        match outcome {
            AnalysisOutcome::Diagnosis {
                disease,
                ranked_treatments,
            } => {
                assert_eq!(disease.id, "tomato-early-blight");
                assert_eq!(ranked_treatments.len(), 2);
                assert_eq!(ranked_treatments[0].id, "t1");
            }
            other => panic!("expected diagnosis, got {other:?}"),
        }

        let counters = engine.counters();
        assert_eq!(counters.analyzed, 1);
        assert_eq!(counters.diseased, 1);
        assert_eq!(counters.healthy, 0);
    }

    #[tokio::test]
    async fn test_unknown_label_degrades_to_placeholder() {
        let engine = engine_with(Arc::new(FixedClassifier::new(
            "Soybean___Frog_eye_leaf_spot",
            0.9,
        )));
        let outcome = engine.analyze(&image()).await.unwrap();

        match outcome {
            AnalysisOutcome::Diagnosis {
                disease,
                ranked_treatments,
            } => {
                assert_eq!(disease.id, "soybean-frog-eye-leaf-spot");
                assert_eq!(ranked_treatments.len(), 1);
                assert_eq!(ranked_treatments[0].id, "consult-expert");
                assert_eq!(ranked_treatments[0].success_rate, 0.0);
            }
            other => panic!("expected placeholder diagnosis, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_classifier_failure_leaves_counters_untouched() {
        let engine = engine_with(Arc::new(FailingClassifier));
        let result = engine.analyze(&image()).await;
        assert!(matches!(result, Err(AnalysisError::Classifier(_))));

        let counters = engine.counters();
        assert_eq!(counters.analyzed, 0);
        assert_eq!(counters.healthy, 0);
        assert_eq!(counters.diseased, 0);
    }

    #[tokio::test]
    async fn test_second_trigger_while_pending_is_a_no_op() {
        let release = Arc::new(Notify::new());
        let engine = Arc::new(engine_with(Arc::new(BlockingClassifier {
            release: release.clone(),
            verdict: ClassifierVerdict::new("Tomato___Early_blight", 0.9),
        })));

        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.analyze(&image()).await })
        };
        // Let the spawned analysis reach the classifier await point
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let second = engine.analyze(&image()).await;
        assert!(matches!(second, Err(AnalysisError::Busy)));

        release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Diagnosis { .. }));
        // Only the first trigger counted
        assert_eq!(engine.counters().analyzed, 1);
    }

    #[tokio::test]
    async fn test_reset_supersedes_in_flight_analysis() {
        let release = Arc::new(Notify::new());
        let engine = Arc::new(engine_with(Arc::new(BlockingClassifier {
            release: release.clone(),
            verdict: ClassifierVerdict::new("Tomato___Early_blight", 0.9),
        })));

        let pending = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.analyze(&image()).await })
        };
        // Let the spawned analysis reach the classifier await point
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        engine.reset();
        release.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(AnalysisError::Superseded)));
        // Stale verdicts update neither state nor statistics
        assert_eq!(engine.counters().analyzed, 0);
        assert!(engine.current_treatment().is_none());
    }

    #[tokio::test]
    async fn test_feedback_advances_then_settles() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)));
        engine.analyze(&image()).await.unwrap();
        assert_eq!(engine.current_treatment().unwrap().id, "t1");

        let ack = engine
            .record_feedback("tomato-early-blight", "t1", false)
            .unwrap();
        match ack {
            FeedbackAck::NextTreatment(next) => assert_eq!(next.id, "t2"),
            other => panic!("expected advancement, got {other:?}"),
        }
        assert_eq!(engine.current_treatment().unwrap().id, "t2");

        let ack = engine
            .record_feedback("tomato-early-blight", "t2", true)
            .unwrap();
        assert_eq!(ack, FeedbackAck::Settled);

        // Both judgments landed in the ledger
        assert_eq!(engine.feedback_stats("t1").total, 1);
        assert_eq!(engine.feedback_stats("t2").positive, 1);
    }

    #[tokio::test]
    async fn test_feedback_exhausts_plan() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)));
        engine.analyze(&image()).await.unwrap();

        engine
            .record_feedback("tomato-early-blight", "t1", false)
            .unwrap();
        let ack = engine
            .record_feedback("tomato-early-blight", "t2", false)
            .unwrap();
        assert_eq!(ack, FeedbackAck::PlanExhausted);
        assert!(engine.current_treatment().is_none());
    }

    #[tokio::test]
    async fn test_feedback_without_active_plan_is_recorded_only() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)));
        let ack = engine
            .record_feedback("removed-disease", "removed-treatment", true)
            .unwrap();
        assert_eq!(ack, FeedbackAck::Recorded);
        assert_eq!(engine.feedback_stats("removed-treatment").total, 1);
    }

    #[tokio::test]
    async fn test_feedback_reorders_next_analysis() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let engine = AdvisorEngine::new(
            AdvisorConfig::default(),
            Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)),
            store,
        );

        engine.analyze(&image()).await.unwrap();
        // Two negatives on t1, two positives on t2:
        // t1 (85 + 0)/2 = 42.5, t2 (78 + 100)/2 = 89
        engine
            .record_feedback("tomato-early-blight", "t1", false)
            .unwrap();
        engine
            .record_feedback("tomato-early-blight", "t1", false)
            .unwrap();
        engine
            .record_feedback("tomato-early-blight", "t2", true)
            .unwrap();
        engine
            .record_feedback("tomato-early-blight", "t2", true)
            .unwrap();

        let outcome = engine.analyze(&image()).await.unwrap();
        match outcome {
            AnalysisOutcome::Diagnosis {
                ranked_treatments, ..
            } => {
                assert_eq!(ranked_treatments[0].id, "t2");
                assert_eq!(ranked_treatments[1].id, "t1");
            }
            other => panic!("expected diagnosis, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_show_alternative_does_not_touch_ledger() {
        let engine = engine_with(Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)));
        engine.analyze(&image()).await.unwrap();

        let alternative = engine.show_alternative().unwrap();
        assert_eq!(alternative.id, "t2");
        assert_eq!(engine.feedback_stats("t1").total, 0);
        assert_eq!(engine.feedback_stats("t2").total, 0);
    }

    #[tokio::test]
    async fn test_state_survives_engine_restart() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        {
            let engine = AdvisorEngine::new(
                AdvisorConfig::default(),
                Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)),
                store.clone(),
            );
            engine.analyze(&image()).await.unwrap();
            engine
                .record_feedback("tomato-early-blight", "t1", false)
                .unwrap();
        }

        let engine = AdvisorEngine::new(
            AdvisorConfig::default(),
            Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)),
            store,
        );
        assert_eq!(engine.counters().analyzed, 1);
        assert_eq!(engine.counters().diseased, 1);
        assert_eq!(engine.feedback_stats("t1").total, 1);
    }

    #[tokio::test]
    async fn test_healthy_clears_previous_plan() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let engine = AdvisorEngine::new(
            AdvisorConfig::default(),
            Arc::new(FixedClassifier::new("Tomato___Early_blight", 0.92)),
            store.clone(),
        );
        engine.analyze(&image()).await.unwrap();
        assert!(engine.current_treatment().is_some());

        let healthy_engine = AdvisorEngine::new(
            AdvisorConfig::default(),
            Arc::new(FixedClassifier::new("Tomato___healthy", 0.92)),
            store,
        );
        healthy_engine.analyze(&image()).await.unwrap();
        assert!(healthy_engine.current_treatment().is_none());
    }
}
