// storefront/src/services/address.rs

//! Best-effort parsing of free-text Indian shipping addresses into the
//! billing fields the carrier expects.

pub const DEFAULT_PINCODE: &str = "110001";
pub const DEFAULT_CITY: &str = "Noida";
pub const DEFAULT_STATE: &str = "Uttar Pradesh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingAddress {
  pub address: String,
  pub city: String,
  pub state: String,
  pub pincode: String,
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

fn is_pincode(token: &str) -> bool {
  token.len() == 6 && token.chars().all(|c| c.is_ascii_digit())
}

/// First standalone six-digit token in `address`.
pub fn extract_pincode(address: &str) -> Option<&str> {
  address.split(|c: char| !is_word_char(c)).find(|token| is_pincode(token))
}

pub fn split_billing_address(raw: &str) -> BillingAddress {
  let text = raw.trim();
  let parts: Vec<&str> = text.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();

  let mut city = DEFAULT_CITY.to_string();
  let mut state = DEFAULT_STATE.to_string();
  let mut address = text.to_string();

  if parts.len() >= 3 {
    let head = match parts.iter().position(|p| is_pincode(p)) {
      Some(idx) => &parts[..idx],
      None => &parts[..],
    };
    match head.len() {
      0 => {}
      1 => {
        city = head[0].to_string();
        address = head[0].to_string();
      }
      n => {
        state = head[n - 1].to_string();
        city = head[n - 2].to_string();
        let rest = head[..n - 2].join(", ");
        address = if rest.is_empty() { head[0].to_string() } else { rest };
      }
    }
  }

  if address.chars().count() < 10 {
    address = text.to_string();
  }

  BillingAddress {
    address,
    city,
    state,
    pincode: extract_pincode(text).unwrap_or(DEFAULT_PINCODE).to_string(),
  }
}

/// First whitespace-separated word, then the rest.
pub fn split_name(full_name: &str) -> (String, String) {
  let mut words = full_name.split_whitespace();
  let first = words.next().map(str::to_string).unwrap_or_else(|| full_name.trim().to_string());
  let last = words.collect::<Vec<_>>().join(" ");
  (first, last)
}

/// Digits only, without a leading `91` country code.
pub fn normalize_phone(raw: &str) -> String {
  let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
  match digits.strip_prefix("91") {
    Some(rest) => rest.to_string(),
    None => digits,
  }
}
