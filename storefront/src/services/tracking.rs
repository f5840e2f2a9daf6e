// storefront/src/services/tracking.rs

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn to_base36(mut n: u64) -> String {
  if n == 0 {
    return "0".to_string();
  }
  let mut digits = Vec::new();
  while n > 0 {
    digits.push(BASE36[(n % 36) as usize]);
    n /= 36;
  }
  digits.reverse();
  String::from_utf8_lossy(&digits).into_owned()
}

pub fn random_base36(len: usize) -> String {
  let mut rng = rand::thread_rng();
  (0..len).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect()
}

/// Local tracking code `TRK-<base36 millis>-<4 base36 chars>`, upper-case.
pub fn generate_tracking_code() -> String {
  let millis = Utc::now().timestamp_millis().max(0) as u64;
  format!("TRK-{}-{}", to_base36(millis), random_base36(4))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base36_encoding() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "Z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
  }

  #[test]
  fn tracking_code_shape() {
    let code = generate_tracking_code();
    let parts: Vec<&str> = code.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "TRK");
    assert_eq!(parts[2].len(), 4);
    assert!(code.chars().all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase()));
  }
}
