// storefront/src/services/star_verification.rs

use crate::errors::{AppError, Result};
use crate::models::NewVerification;
use crate::services::discount::github_login;
use crate::services::github::{StarCheck, StarChecker};
use crate::store::VerificationStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutcome {
  pub verified: bool,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub already_verified: bool,
  pub github_username: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub verified_at: Option<DateTime<Utc>>,
  pub message: String,
}

impl VerifyOutcome {
  fn not_verified(username: &str, message: impl Into<String>) -> Self {
    Self {
      verified: false,
      already_verified: false,
      github_username: username.to_string(),
      verified_at: None,
      message: message.into(),
    }
  }
}

/// Checks that `raw_username` starred the configured repository and records
/// the verification. An existing record short-circuits the GitHub call.
#[instrument(name = "star_verification::verify_star", skip(store, stars))]
pub async fn verify_star<S>(
  store: &S,
  stars: &dyn StarChecker,
  raw_username: &str,
  user_email: Option<&str>,
) -> Result<VerifyOutcome>
where
  S: VerificationStore + ?Sized,
{
  let username = github_login(Some(raw_username))?;

  if let Some(existing) = store.find_by_username(&username).await? {
    return Ok(VerifyOutcome {
      verified: true,
      already_verified: true,
      github_username: username,
      verified_at: Some(existing.verified_at),
      message: "User already verified".to_string(),
    });
  }

  if !stars.is_configured() {
    return Err(AppError::Config("GitHub token not configured".to_string()));
  }

  match stars.has_starred(&username).await? {
    StarCheck::Starred => {}
    StarCheck::UserNotFound => return Ok(VerifyOutcome::not_verified(&username, "GitHub user not found")),
    StarCheck::Failed(reason) => {
      info!(%reason, "Star status could not be determined.");
      return Ok(VerifyOutcome::not_verified(&username, "Failed to verify star status"));
    }
    StarCheck::NotStarred => {
      let message = format!("User has not starred {}/{}", stars.repo_owner(), stars.repo_name());
      return Ok(VerifyOutcome::not_verified(&username, message));
    }
  }

  let inserted = store
    .insert_verification(NewVerification {
      github_username: username.clone(),
      user_email: user_email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
      repo_owner: stars.repo_owner().to_string(),
      repo_name: stars.repo_name().to_string(),
      verified_at: Utc::now(),
    })
    .await?;

  // A concurrent request may have recorded the same user first.
  let record = match inserted {
    Some(record) => Some(record),
    None => store.find_by_username(&username).await?,
  };

  info!(%username, "GitHub star verified.");
  Ok(VerifyOutcome {
    verified: true,
    already_verified: false,
    github_username: username,
    verified_at: record.map(|r| r.verified_at),
    message: "Star verified and stored successfully".to_string(),
  })
}
