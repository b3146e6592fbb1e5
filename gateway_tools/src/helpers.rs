/// Gateway object ids are short ASCII tokens such as `cs_test_a1B2c3`. Anything else is rejected before it is
/// interpolated into a request path.
pub fn is_valid_object_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 255 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// The gateway reports currencies in lower case. The rest of the system uses upper-case ISO codes.
pub fn normalize_currency(currency: &str) -> String {
    currency.trim().to_ascii_uppercase()
}
