//! Recipient list parsing.

/// Split a delimited recipient list into individual addresses.
///
/// Entries are separated by commas or newlines. Each entry is trimmed and
/// empty entries are dropped. Order is preserved and duplicates are kept.
///
/// ```
/// use formmail::parse_recipients;
///
/// assert_eq!(
///     parse_recipients("a@x.com, b@y.com"),
///     vec!["a@x.com".to_string(), "b@y.com".to_string()]
/// );
/// assert!(parse_recipients("   ").is_empty());
/// ```
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
