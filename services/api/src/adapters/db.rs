//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use satyashodh_core::domain::{
    FraudDetectionRecord, InputKind, Language, SummaryRecord, UserCredentials, UserProfile,
    Verdict,
};
use satyashodh_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn parse_input_kind(value: &str) -> PortResult<InputKind> {
    InputKind::parse(value)
        .ok_or_else(|| PortError::Unexpected(format!("Unknown input type '{}' in history", value)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    user_id: Uuid,
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email,
            display_name: self.display_name,
            photo_url: self.photo_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct FraudRecordRow {
    id: Uuid,
    user_id: Uuid,
    input_type: String,
    input_content: String,
    verdict: String,
    fraud_percentage: f64,
    explanation: String,
    analysis_timestamp: DateTime<Utc>,
}
impl FraudRecordRow {
    fn to_domain(self) -> PortResult<FraudDetectionRecord> {
        let verdict = Verdict::parse(&self.verdict).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown verdict '{}' in history", self.verdict))
        })?;
        Ok(FraudDetectionRecord {
            id: self.id,
            user_id: self.user_id,
            input_type: parse_input_kind(&self.input_type)?,
            input_content: self.input_content,
            verdict,
            fraud_percentage: self.fraud_percentage,
            explanation: self.explanation,
            analysis_timestamp: self.analysis_timestamp,
        })
    }
}

#[derive(FromRow)]
struct SummaryRecordRow {
    id: Uuid,
    user_id: Uuid,
    input_type: String,
    input_content: String,
    summarized_content: String,
    input_language: Option<String>,
    output_language: String,
    summary_timestamp: DateTime<Utc>,
}
impl SummaryRecordRow {
    fn to_domain(self) -> PortResult<SummaryRecord> {
        let output_language = Language::from_name(&self.output_language).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Unknown output language '{}' in history",
                self.output_language
            ))
        })?;
        Ok(SummaryRecord {
            id: self.id,
            user_id: self.user_id,
            input_type: parse_input_kind(&self.input_type)?,
            input_content: self.input_content,
            summarized_content: self.summarized_content,
            input_language: self.input_language,
            output_language,
            summary_timestamp: self.summary_timestamp,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
    ) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .map_or(false, |db_err| db_err.is_unique_violation());
            if duplicate {
                PortError::Conflict(format!("An account for {} already exists", email))
            } else {
                unexpected(e)
            }
        })?;

        Ok(UserProfile {
            user_id: record.user_id,
            email: record.email,
            display_name: display_name.map(str::to_string),
            photo_url: None,
            created_at: Utc::now(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn upsert_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, email, display_name, photo_url, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET \
                email = EXCLUDED.email, \
                display_name = COALESCE(EXCLUDED.display_name, user_profiles.display_name), \
                photo_url = COALESCE(EXCLUDED.photo_url, user_profiles.photo_url)",
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(&profile.photo_url)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_user_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, email, display_name, photo_url, created_at \
             FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Profile for user {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn append_fraud_record(&self, record: &FraudDetectionRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO fraud_detection_history \
             (id, user_id, input_type, input_content, verdict, fraud_percentage, explanation, analysis_timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.input_type.as_str())
        .bind(&record.input_content)
        .bind(record.verdict.as_str())
        .bind(record.fraud_percentage)
        .bind(&record.explanation)
        .bind(record.analysis_timestamp)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn append_summary_record(&self, record: &SummaryRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO ai_summary_history \
             (id, user_id, input_type, input_content, summarized_content, input_language, output_language, summary_timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.input_type.as_str())
        .bind(&record.input_content)
        .bind(&record.summarized_content)
        .bind(&record.input_language)
        .bind(record.output_language.name())
        .bind(record.summary_timestamp)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_fraud_history(&self, user_id: Uuid) -> PortResult<Vec<FraudDetectionRecord>> {
        let rows = sqlx::query_as::<_, FraudRecordRow>(
            "SELECT id, user_id, input_type, input_content, verdict, fraud_percentage, explanation, analysis_timestamp \
             FROM fraud_detection_history WHERE user_id = $1 ORDER BY analysis_timestamp DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows.into_iter().map(FraudRecordRow::to_domain).collect()
    }

    async fn list_summary_history(&self, user_id: Uuid) -> PortResult<Vec<SummaryRecord>> {
        let rows = sqlx::query_as::<_, SummaryRecordRow>(
            "SELECT id, user_id, input_type, input_content, summarized_content, input_language, output_language, summary_timestamp \
             FROM ai_summary_history WHERE user_id = $1 ORDER BY summary_timestamp DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows.into_iter().map(SummaryRecordRow::to_domain).collect()
    }
}
