// storefront/src/services/pricing.rs

use crate::config::AppConfig;
use crate::models::PaymentCurrency;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPrice {
  pub currency: PaymentCurrency,
  pub amount: Decimal,
  pub display: String,
}

/// Canonical per-unit token prices for this deployment.
#[derive(Debug, Clone)]
pub struct PriceList {
  prices: Vec<TokenPrice>,
}

impl PriceList {
  pub fn new(fet: Decimal, usdc: Decimal) -> Self {
    let entry = |currency, amount: Decimal| TokenPrice {
      currency,
      amount,
      display: format_token_amount(amount),
    };
    Self {
      prices: vec![entry(PaymentCurrency::FET, fet), entry(PaymentCurrency::USDC, usdc)],
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(config.price_fet, config.price_usdc)
  }

  pub fn prices(&self) -> &[TokenPrice] {
    &self.prices
  }

  pub fn price_for(&self, currency: PaymentCurrency) -> Option<Decimal> {
    self.prices.iter().find(|p| p.currency == currency).map(|p| p.amount)
  }
}

/// At most six decimals, trailing zeros trimmed.
pub fn format_token_amount(value: Decimal) -> String {
  value
    .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
    .normalize()
    .to_string()
}
