// storefront/src/models/verified_user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A GitHub account known to have starred the promoted repository.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VerifiedGithubUser {
  pub id: Uuid,
  /// Always stored lower-cased.
  pub github_username: String,
  pub user_email: Option<String>,
  pub repo_owner: String,
  pub repo_name: String,
  pub verified_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVerification {
  pub github_username: String,
  pub user_email: Option<String>,
  pub repo_owner: String,
  pub repo_name: String,
  pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Inserted,
  Updated,
  Unchanged,
}
