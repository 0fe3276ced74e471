use bigdecimal::BigDecimal;
use std::fmt;

pub const NAME_MAX_LEN: usize = 120;
pub const PHONE_MIN_DIGITS: usize = 9;
pub const PHONE_MAX_DIGITS: usize = 15;
pub const SLUG_MAX_LEN: usize = 48;
pub const NOTE_MAX_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Strip control characters and collapse runs of whitespace.
pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "wajib diisi"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("maksimal {} karakter", max_len),
        ));
    }

    Ok(())
}

/// Indonesian phone number: digits only after an optional `+`, starting with
/// `08` or `62`, within the usual MSISDN length range.
pub fn validate_phone(field: &'static str, phone: &str) -> ValidationResult {
    let phone = sanitize_string(phone);
    validate_required(field, &phone)?;

    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(field, "hanya boleh berisi angka"));
    }
    if digits.len() < PHONE_MIN_DIGITS || digits.len() > PHONE_MAX_DIGITS {
        return Err(ValidationError::new(
            field,
            format!(
                "panjang harus {} sampai {} digit",
                PHONE_MIN_DIGITS, PHONE_MAX_DIGITS
            ),
        ));
    }
    if !digits.starts_with("08") && !digits.starts_with("62") {
        return Err(ValidationError::new(
            field,
            "harus diawali 08 atau 62",
        ));
    }

    Ok(())
}

/// Catalog slug: lowercase letters, digits, and dashes.
pub fn validate_slug(slug: &str) -> ValidationResult {
    let slug = sanitize_string(slug);
    validate_required("catalog_slug", &slug)?;
    validate_max_len("catalog_slug", &slug, SLUG_MAX_LEN)?;

    if !slug
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    {
        return Err(ValidationError::new(
            "catalog_slug",
            "hanya boleh huruf kecil, angka, dan tanda hubung",
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(ValidationError::new(
            "catalog_slug",
            "tidak boleh diawali atau diakhiri tanda hubung",
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "harus lebih dari nol"));
    }

    Ok(())
}

pub fn validate_non_negative_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount < &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "tidak boleh negatif"));
    }

    Ok(())
}

pub fn validate_quantity(field: &'static str, quantity: i64) -> ValidationResult {
    if quantity <= 0 {
        return Err(ValidationError::new(field, "harus lebih dari nol"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("name", "Warung Bu Sri").is_ok());
        assert!(validate_required("name", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("name", "abc", 3).is_ok());
        assert!(validate_max_len("name", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  halo\tdunia  "), "halo dunia");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn validates_phone_numbers() {
        assert!(validate_phone("phone", "081234567890").is_ok());
        assert!(validate_phone("phone", "6281234567890").is_ok());
        assert!(validate_phone("phone", "+6281234567890").is_ok());
        assert!(validate_phone("phone", " 081234567890 ").is_ok());
        assert!(validate_phone("phone", "12345678901").is_err());
        assert!(validate_phone("phone", "0812345").is_err());
        assert!(validate_phone("phone", "08123abc456").is_err());
        assert!(validate_phone("phone", "").is_err());
    }

    #[test]
    fn validates_slugs() {
        assert!(validate_slug("warung-bu-sri").is_ok());
        assert!(validate_slug("toko123").is_ok());
        assert!(validate_slug("Warung").is_err());
        assert!(validate_slug("-warung").is_err());
        assert!(validate_slug("warung-").is_err());
        assert!(validate_slug("warung bu").is_err());
        assert!(validate_slug(&"a".repeat(SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn validates_amounts() {
        let positive = BigDecimal::from_str("10000.50").unwrap();
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount("amount", &positive).is_ok());
        assert!(validate_positive_amount("amount", &zero).is_err());
        assert!(validate_positive_amount("amount", &negative).is_err());

        assert!(validate_non_negative_amount("discount", &zero).is_ok());
        assert!(validate_non_negative_amount("discount", &negative).is_err());
    }

    #[test]
    fn validates_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -2).is_err());
    }
}
