use chrono::{DateTime, NaiveDate};

/// Extract the numeric part of a formatted price such as `"BR$59.90"`.
///
/// Everything before the first ASCII digit is treated as currency prefix.
/// A lone decimal comma (`"R$ 59,90"`) is rewritten to a dot. Returns `None`
/// when the input has no digits at all (e.g. `"Free"`).
pub fn parse_price(formatted: &str) -> Option<String> {
    let start = formatted.find(|c: char| c.is_ascii_digit())?;
    let amount: String = formatted[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let amount = match (amount.matches(',').count(), amount.contains('.')) {
        (1, false) => amount.replace(',', "."),
        // thousands separators
        (_, true) => amount.replace(',', ""),
        _ => amount,
    };
    let amount = amount.trim_end_matches('.').to_string();
    if amount.is_empty() {
        None
    } else {
        Some(amount)
    }
}

/// Parse the upstream release date. Accepts `YYYY-MM-DD`, `YYYY.MM.DD`
/// and full RFC 3339 timestamps.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%d", "%Y.%m.%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            // "2019-11-22T00:00:00" without offset
            raw.get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        })
}
