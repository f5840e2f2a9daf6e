// storefront/src/services/product_search.rs

//! Keyword search over the catalog for the shopping agent.

use crate::models::Product;
use serde::Serialize;

pub const MAX_RESULTS: usize = 5;
const NAME_HIT: u32 = 2;
const DESCRIPTION_HIT: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct ProductMatch {
  #[serde(flatten)]
  pub product: Product,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub match_score: Option<u32>,
  pub full_image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
  pub products: Vec<ProductMatch>,
  /// Products that scored; zero means `products` is the unranked fallback.
  pub matched: usize,
}

impl SearchResult {
  pub fn message(&self) -> String {
    if self.matched > 0 {
      format!("Found {} matching product(s)", self.matched)
    } else {
      "Showing all available products".to_string()
    }
  }
}

/// Each keyword found in the name adds 2, in the description 1.
pub fn score(product: &Product, keywords: &[String]) -> u32 {
  let name = product.name.to_lowercase();
  let description = product.description.as_deref().unwrap_or_default().to_lowercase();
  keywords
    .iter()
    .map(|k| {
      let mut points = 0;
      if name.contains(k.as_str()) {
        points += NAME_HIT;
      }
      if description.contains(k.as_str()) {
        points += DESCRIPTION_HIT;
      }
      points
    })
    .sum()
}

/// Relative image paths are joined onto `base_url`.
pub fn absolute_image_url(image_url: &str, base_url: &str) -> String {
  if image_url.starts_with("http") {
    return image_url.to_string();
  }
  let base = base_url.trim_end_matches('/');
  if image_url.starts_with('/') {
    format!("{}{}", base, image_url)
  } else {
    format!("{}/{}", base, image_url)
  }
}

fn with_absolute_image(mut product: Product, match_score: Option<u32>, base_url: &str) -> ProductMatch {
  product.image_url = product
    .image_url
    .filter(|url| !url.is_empty())
    .map(|url| absolute_image_url(&url, base_url));
  ProductMatch {
    full_image_url: product.image_url.clone(),
    product,
    match_score,
  }
}

/// Top `MAX_RESULTS` products by score, ties keeping catalog order. When
/// nothing matches, the first `MAX_RESULTS` products unranked.
pub fn search(products: Vec<Product>, query: &str, base_url: &str) -> SearchResult {
  let keywords: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();

  let mut scored: Vec<(u32, Product)> = products
    .iter()
    .map(|p| (score(p, &keywords), p))
    .filter(|(s, _)| *s > 0)
    .map(|(s, p)| (s, p.clone()))
    .collect();
  scored.sort_by(|a, b| b.0.cmp(&a.0));
  scored.truncate(MAX_RESULTS);

  if scored.is_empty() {
    let fallback = products
      .into_iter()
      .take(MAX_RESULTS)
      .map(|p| with_absolute_image(p, None, base_url))
      .collect();
    return SearchResult {
      products: fallback,
      matched: 0,
    };
  }

  let matched = scored.len();
  SearchResult {
    products: scored
      .into_iter()
      .map(|(s, p)| with_absolute_image(p, Some(s), base_url))
      .collect(),
    matched,
  }
}
