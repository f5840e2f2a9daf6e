// storefront/src/services/discount.rs

//! GitHub-star discount: a verified stargazer gets a flat percentage off.

use crate::errors::{AppError, Result};
use crate::services::github::StarChecker;
use crate::services::star_verification::verify_star;
use crate::store::VerificationStore;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct DiscountPolicy {
  pub per_star_rate: Decimal,
  pub min_stars: u32,
  pub max_percentage: Decimal,
}

impl Default for DiscountPolicy {
  fn default() -> Self {
    Self {
      per_star_rate: Decimal::from(5),
      min_stars: 1,
      max_percentage: Decimal::from(100),
    }
  }
}

impl DiscountPolicy {
  pub fn percentage(&self) -> Decimal {
    self
      .per_star_rate
      .checked_mul(Decimal::from(self.min_stars))
      .map_or(self.max_percentage, |p| p.min(self.max_percentage))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountBreakdown {
  pub original_amount: Decimal,
  pub discount_percentage: Decimal,
  pub discount_amount: Decimal,
  pub final_amount: Decimal,
  pub github_verified: bool,
  pub github_username: Option<String>,
}

impl DiscountBreakdown {
  pub fn none(original_amount: Decimal) -> Self {
    Self {
      original_amount,
      discount_percentage: Decimal::ZERO,
      discount_amount: Decimal::ZERO,
      final_amount: original_amount,
      github_verified: false,
      github_username: None,
    }
  }

  pub fn verified(original_amount: Decimal, percentage: Decimal, username: Option<String>) -> Result<Self> {
    let discount_amount = original_amount
      .checked_mul(percentage)
      .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
      .ok_or_else(|| AppError::Validation("original_amount is too large".to_string()))?;
    Ok(Self {
      original_amount,
      discount_percentage: percentage,
      discount_amount,
      final_amount: (original_amount - discount_amount).max(Decimal::ZERO),
      github_verified: true,
      github_username: username,
    })
  }
}

/// Strips a leading `@`, trims and lower-cases. Empty input yields `None`.
pub fn normalize_username(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_lowercase())
  }
}

/// GitHub's login rule: 1 to 39 of `[a-z0-9-]`, not starting with a hyphen.
pub fn is_valid_github_login(login: &str) -> bool {
  let bytes = login.as_bytes();
  !bytes.is_empty()
    && bytes.len() <= 39
    && bytes[0] != b'-'
    && bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

/// Normalized login from request input, or a validation error.
pub fn github_login(raw: Option<&str>) -> Result<String> {
  let username = raw
    .and_then(normalize_username)
    .ok_or_else(|| AppError::Validation("github_username is required".to_string()))?;
  if !is_valid_github_login(&username) {
    return Err(AppError::Validation(format!("Invalid GitHub username: {}", username)));
  }
  Ok(username)
}

fn normalize_email(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_lowercase())
  }
}

/// Computes the discount for `original_amount`.
///
/// Lookup order is stored record by username, stored record by email, then a
/// live star check against GitHub when a username was given. A failed live
/// check counts as "not verified"; store failures are returned.
#[instrument(name = "discount::evaluate", skip_all, fields(%original_amount))]
pub async fn evaluate<S>(
  store: &S,
  stars: &dyn StarChecker,
  policy: &DiscountPolicy,
  github_username: Option<&str>,
  user_email: Option<&str>,
  original_amount: Decimal,
) -> Result<DiscountBreakdown>
where
  S: VerificationStore + ?Sized,
{
  let username = github_username
    .and_then(normalize_username)
    .filter(|name| is_valid_github_login(name));
  let email = user_email.and_then(normalize_email);

  if let Some(name) = &username {
    if let Some(record) = store.find_by_username(name).await? {
      debug!(username = %record.github_username, "Discount granted from stored verification.");
      return DiscountBreakdown::verified(original_amount, policy.percentage(), username);
    }
  }

  if let Some(mail) = &email {
    if let Some(record) = store.find_by_email(mail).await? {
      debug!(username = %record.github_username, "Discount granted from verification matched by email.");
      let handle = username.clone().or(Some(record.github_username));
      return DiscountBreakdown::verified(original_amount, policy.percentage(), handle);
    }
  }

  if let Some(name) = &username {
    match verify_star(store, stars, name, email.as_deref()).await {
      Ok(outcome) if outcome.verified => {
        return DiscountBreakdown::verified(original_amount, policy.percentage(), username);
      }
      Ok(outcome) => debug!(message = %outcome.message, "Live star check did not verify user."),
      Err(e) => warn!(error = %e, "Live star check failed; no discount applied."),
    }
  }

  Ok(DiscountBreakdown::none(original_amount))
}
