//! crates/satyashodh_core/src/history.rs
//!
//! Builds history records from completed flows and writes them on a best-effort basis.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    AnalysisRequest, AnalysisResult, FraudDetectionRecord, HistoryRecord, SummaryRecord,
    SummaryResult,
};
use crate::ports::{DatabaseService, PortResult};

impl FraudDetectionRecord {
    pub fn from_analysis(
        user_id: Uuid,
        request: &AnalysisRequest,
        result: &AnalysisResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            input_type: request.input.kind(),
            input_content: request.input.history_label(),
            verdict: result.verdict,
            fraud_percentage: result.fraud_percentage,
            explanation: result.explanation.clone(),
            analysis_timestamp: Utc::now(),
        }
    }
}

impl SummaryRecord {
    pub fn from_summary(user_id: Uuid, request: &AnalysisRequest, result: &SummaryResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            input_type: request.input.kind(),
            input_content: request.input.history_label(),
            summarized_content: result.summary.clone(),
            // The input language is not detected.
            input_language: None,
            output_language: request.language.unwrap_or_default(),
            summary_timestamp: Utc::now(),
        }
    }
}

/// Appends one record. A failure is logged and returned, and callers are free to
/// drop it: history never blocks or fails the flow that produced it.
pub async fn record_best_effort(
    db: &dyn DatabaseService,
    record: &HistoryRecord,
) -> PortResult<()> {
    let result = match record {
        HistoryRecord::FraudDetection(r) => db.append_fraud_record(r).await,
        HistoryRecord::Summary(r) => db.append_summary_record(r).await,
    };
    match &result {
        Ok(()) => debug!(user_id = %record.user_id(), "History record saved"),
        Err(e) => warn!(user_id = %record.user_id(), error = %e, "Failed to save history record"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ContentInput, InputKind, Language, MediaInput, UserCredentials, UserProfile, Verdict,
    };
    use crate::ports::PortError;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDb {
        fail: bool,
        fraud: Mutex<Vec<FraudDetectionRecord>>,
        summaries: Mutex<Vec<SummaryRecord>>,
    }

    #[async_trait]
    impl DatabaseService for RecordingDb {
        async fn create_user_with_email(
            &self,
            _: &str,
            _: &str,
            _: Option<&str>,
        ) -> PortResult<UserProfile> {
            unimplemented!()
        }
        async fn get_user_by_email(&self, _: &str) -> PortResult<UserCredentials> {
            unimplemented!()
        }
        async fn upsert_user_profile(&self, _: &UserProfile) -> PortResult<()> {
            unimplemented!()
        }
        async fn get_user_profile(&self, _: Uuid) -> PortResult<UserProfile> {
            unimplemented!()
        }
        async fn create_auth_session(&self, _: &str, _: Uuid, _: DateTime<Utc>) -> PortResult<()> {
            unimplemented!()
        }
        async fn validate_auth_session(&self, _: &str) -> PortResult<Uuid> {
            unimplemented!()
        }
        async fn delete_auth_session(&self, _: &str) -> PortResult<()> {
            unimplemented!()
        }
        async fn append_fraud_record(&self, record: &FraudDetectionRecord) -> PortResult<()> {
            if self.fail {
                return Err(PortError::Unexpected("database offline".into()));
            }
            self.fraud.lock().unwrap().push(record.clone());
            Ok(())
        }
        async fn append_summary_record(&self, record: &SummaryRecord) -> PortResult<()> {
            if self.fail {
                return Err(PortError::Unexpected("database offline".into()));
            }
            self.summaries.lock().unwrap().push(record.clone());
            Ok(())
        }
        async fn list_fraud_history(&self, _: Uuid) -> PortResult<Vec<FraudDetectionRecord>> {
            Ok(self.fraud.lock().unwrap().clone())
        }
        async fn list_summary_history(&self, _: Uuid) -> PortResult<Vec<SummaryRecord>> {
            Ok(self.summaries.lock().unwrap().clone())
        }
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            verdict: Verdict::Fraudulent,
            fraud_percentage: 92.0,
            explanation: "No credible source.".into(),
        }
    }

    #[tokio::test]
    async fn fraud_record_mirrors_the_result() {
        let db = RecordingDb::default();
        let user_id = Uuid::new_v4();
        let request = AnalysisRequest {
            input: ContentInput::Text("Obama secretly a robot".into()),
            language: None,
        };
        let record = FraudDetectionRecord::from_analysis(user_id, &request, &analysis());

        record_best_effort(&db, &HistoryRecord::FraudDetection(record))
            .await
            .unwrap();

        let saved = db.fraud.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_id, user_id);
        assert_eq!(saved[0].input_type, InputKind::Text);
        assert_eq!(saved[0].input_content, "Obama secretly a robot");
        assert_eq!(saved[0].verdict, Verdict::Fraudulent);
        assert_eq!(saved[0].fraud_percentage, 92.0);
        assert_eq!(saved[0].explanation, "No credible source.");
    }

    #[tokio::test]
    async fn summary_record_uses_file_name_and_output_language() {
        let request = AnalysisRequest {
            input: ContentInput::File(MediaInput {
                data_uri: "data:application/pdf;base64,JVBERi0xLjQ=".into(),
                file_name: Some("report.pdf".into()),
            }),
            language: Some(Language::Urdu),
        };
        let record = SummaryRecord::from_summary(
            Uuid::new_v4(),
            &request,
            &SummaryResult { summary: "Short.".into() },
        );
        assert_eq!(record.input_content, "report.pdf");
        assert_eq!(record.input_type, InputKind::File);
        assert_eq!(record.output_language, Language::Urdu);
        assert_eq!(record.input_language, None);
    }

    #[tokio::test]
    async fn failed_write_is_reported_not_raised() {
        let db = RecordingDb { fail: true, ..Default::default() };
        let request = AnalysisRequest {
            input: ContentInput::Link("https://example.com".into()),
            language: None,
        };
        let record = FraudDetectionRecord::from_analysis(Uuid::new_v4(), &request, &analysis());
        let outcome = record_best_effort(&db, &HistoryRecord::FraudDetection(record)).await;
        assert!(outcome.is_err());
        assert!(db.fraud.lock().unwrap().is_empty());
    }
}
