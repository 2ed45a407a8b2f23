/// Splits a raw query string into an ordered statement batch.
///
/// Fragments are trimmed and empties are dropped, so trailing separators and
/// whitespace-only segments never reach the executor. Order is preserved;
/// the executor runs statements strictly in this order.
pub fn split_statements(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}
