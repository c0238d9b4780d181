//! Rider display-name masking.
//!
//! Offer notifications never expose the rider's full identity; drivers see
//! the first given name plus a single-letter last initial.

/// Masks a rider's full name for display to drivers.
///
/// - `"Asha Rao"` -> `"Asha R."`
/// - `"Asha"` -> `"Asha"`
/// - empty / whitespace -> `"Customer"`
pub fn mask_rider_name(full_name: &str) -> String {
    let mut parts = full_name.split_whitespace();

    let first = match parts.next() {
        Some(token) => token,
        None => return "Customer".to_string(),
    };

    match parts.last() {
        Some(last) => {
            let initial = last
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_default();
            if initial.is_empty() {
                first.to_string()
            } else {
                format!("{} {}.", first, initial)
            }
        }
        None => first.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_part_name() {
        assert_eq!(mask_rider_name("Asha Rao"), "Asha R.");
        assert_eq!(mask_rider_name("likhitha maradugu"), "likhitha M.");
    }

    #[test]
    fn test_many_part_name_uses_last_token() {
        assert_eq!(mask_rider_name("Jose Luis Garcia"), "Jose G.");
    }

    #[test]
    fn test_single_name_unchanged() {
        assert_eq!(mask_rider_name("Asha"), "Asha");
    }

    #[test]
    fn test_empty_yields_customer() {
        assert_eq!(mask_rider_name(""), "Customer");
        assert_eq!(mask_rider_name("   "), "Customer");
    }

    #[test]
    fn test_extra_whitespace_ignored() {
        assert_eq!(mask_rider_name("  Asha   Rao  "), "Asha R.");
    }

    #[test]
    fn test_masking_is_idempotent() {
        for name in ["Asha Rao", "Asha", "", "Jose Luis Garcia"] {
            let once = mask_rider_name(name);
            assert_eq!(mask_rider_name(&once), once);
        }
    }
}
