// storefront/src/services/github.rs

//! GitHub REST client for star checks and stargazer listings.

use crate::config::GithubConfig;
use crate::errors::{AppError, Result};
use crate::services::endpoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const PER_PAGE: usize = 100;
/// Upper bound on `/users/{u}/starred` pages scanned per check.
const MAX_STARRED_PAGES: u32 = 10;
const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const ACCEPT_STAR: &str = "application/vnd.github.v3.star+json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarCheck {
  Starred,
  NotStarred,
  UserNotFound,
  /// Any other failure talking to GitHub.
  Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stargazer {
  /// Lower-cased.
  pub login: String,
  pub starred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct StargazerListing {
  pub stargazers: Vec<Stargazer>,
  /// Set when paging stopped on a failed page; earlier pages are kept.
  pub stopped_early: Option<String>,
}

#[async_trait]
pub trait StarChecker: Send + Sync {
  /// False when no API token is configured.
  fn is_configured(&self) -> bool;
  fn repo_owner(&self) -> &str;
  fn repo_name(&self) -> &str;
  async fn has_starred(&self, username: &str) -> Result<StarCheck>;
  async fn stargazers(&self) -> Result<StargazerListing>;
}

#[derive(Deserialize)]
struct RepoOwner {
  login: Option<String>,
}

#[derive(Deserialize)]
struct StarredRepo {
  name: Option<String>,
  owner: Option<RepoOwner>,
}

#[derive(Deserialize)]
struct StarUser {
  login: Option<String>,
}

#[derive(Deserialize)]
struct StargazerEntry {
  user: Option<StarUser>,
  starred_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct GithubClient {
  http: reqwest::Client,
  base_url: String,
  token: Option<String>,
  repo_owner: String,
  repo_name: String,
}

impl GithubClient {
  pub fn new(config: &GithubConfig) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build GitHub HTTP client: {}", e)))?;
    Ok(Self {
      http,
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
      token: config.token.clone(),
      repo_owner: config.repo_owner.clone(),
      repo_name: config.repo_name.clone(),
    })
  }

  fn token(&self) -> Result<&str> {
    self
      .token
      .as_deref()
      .ok_or_else(|| AppError::Config("GitHub token not configured".to_string()))
  }

  fn is_target_repo(&self, repo: &StarredRepo) -> bool {
    let owner_matches = repo
      .owner
      .as_ref()
      .and_then(|o| o.login.as_deref())
      .is_some_and(|login| login.eq_ignore_ascii_case(&self.repo_owner));
    let name_matches = repo
      .name
      .as_deref()
      .is_some_and(|name| name.eq_ignore_ascii_case(&self.repo_name));
    owner_matches && name_matches
  }
}

#[async_trait]
impl StarChecker for GithubClient {
  fn is_configured(&self) -> bool {
    self.token.is_some()
  }

  fn repo_owner(&self) -> &str {
    &self.repo_owner
  }

  fn repo_name(&self) -> &str {
    &self.repo_name
  }

  #[instrument(name = "GithubClient::has_starred", skip(self))]
  async fn has_starred(&self, username: &str) -> Result<StarCheck> {
    let token = self.token()?;
    let url = endpoint(&self.base_url, &["users", username, "starred"])?;

    for page in 1..=MAX_STARRED_PAGES {
      let response = match self
        .http
        .get(url.clone())
        .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
        .header("Authorization", format!("token {}", token))
        .header("Accept", ACCEPT_V3)
        .send()
        .await
      {
        Ok(r) => r,
        Err(e) => return Ok(StarCheck::Failed(e.to_string())),
      };

      let status = response.status();
      if status == StatusCode::NOT_FOUND {
        return Ok(StarCheck::UserNotFound);
      }
      if !status.is_success() {
        warn!(%status, page, "GitHub starred listing failed.");
        return Ok(StarCheck::Failed(format!("GitHub responded with {}", status)));
      }

      let repos: Vec<StarredRepo> = match response.json().await {
        Ok(repos) => repos,
        Err(e) => return Ok(StarCheck::Failed(e.to_string())),
      };
      if repos.iter().any(|r| self.is_target_repo(r)) {
        debug!(page, "Target repository found in starred list.");
        return Ok(StarCheck::Starred);
      }
      if repos.len() < PER_PAGE {
        break;
      }
    }

    Ok(StarCheck::NotStarred)
  }

  #[instrument(name = "GithubClient::stargazers", skip(self))]
  async fn stargazers(&self) -> Result<StargazerListing> {
    let token = self.token()?;
    let url = endpoint(&self.base_url, &["repos", self.repo_owner.as_str(), self.repo_name.as_str(), "stargazers"])?;
    let mut listing = StargazerListing::default();
    let mut page: u32 = 1;

    loop {
      let result = self
        .http
        .get(url.clone())
        .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())])
        .header("Authorization", format!("token {}", token))
        .header("Accept", ACCEPT_STAR)
        .send()
        .await
        .and_then(|r| r.error_for_status());

      let entries: Vec<StargazerEntry> = match result {
        Ok(response) => match response.json().await {
          Ok(entries) => entries,
          Err(e) => {
            warn!(page, error = %e, "Unreadable stargazer page; keeping earlier pages.");
            listing.stopped_early = Some(format!("page {}: {}", page, e));
            break;
          }
        },
        Err(e) => {
          warn!(page, error = %e, "Stargazer page request failed; keeping earlier pages.");
          listing.stopped_early = Some(format!("page {}: {}", page, e));
          break;
        }
      };

      let count = entries.len();
      listing.stargazers.extend(entries.into_iter().filter_map(|entry| {
        let login = entry.user?.login?.to_lowercase();
        Some(Stargazer {
          login,
          starred_at: entry.starred_at,
        })
      }));

      if count < PER_PAGE {
        break;
      }
      page += 1;
    }

    debug!(total = listing.stargazers.len(), pages = page, "Fetched stargazers.");
    Ok(listing)
  }
}
