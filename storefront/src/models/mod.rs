// storefront/src/models/mod.rs

//! Persisted entities and their write shapes.

pub mod dealer;
pub mod delivery_partner;
pub mod order;
pub mod product;
pub mod verified_user;

pub use dealer::{Dealer, DealerFilter, NewDealer};
pub use delivery_partner::{DeliveryPartner, DeliveryPartnerPatch, NewDeliveryPartner, PartnerFilter};
pub use order::{
  FulfillmentUpdate, NewOrder, Order, OrderFilter, OrderPatch, OrderStatus, PaymentCurrency, PaymentStatus,
  PaymentUpdate,
};
pub use product::{NewProduct, Product, ProductPatch, StockDecrement, StockMap};
pub use verified_user::{NewVerification, UpsertOutcome, VerifiedGithubUser};

/// Trimmed, non-empty string field.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
