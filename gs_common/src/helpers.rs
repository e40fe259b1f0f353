/// Normalises a currency code the way payment providers expect it: trimmed and lower-case.
/// Blank input falls back to `default`.
pub fn normalize_currency(currency: Option<&str>, default: &str) -> String {
    match currency.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_ascii_lowercase(),
        _ => default.to_ascii_lowercase(),
    }
}
