use once_cell::sync::Lazy;
use regex::Regex;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|ftp)://[-a-zA-Z0-9+&@#/%?=~_|!:,.;]*[-a-zA-Z0-9+&@#/%=~_|]$")
        .expect("URL pattern is valid")
});

/// Checks a trimmed URL against the accepted schemes and character set.
pub fn is_valid(url: &str) -> bool {
    let trimmed = url.trim();
    !trimmed.is_empty() && URL_PATTERN.is_match(trimmed)
}

/// Trims the input and prefixes `https://` when no scheme is given.
pub fn sanitize(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") || trimmed.starts_with("ftp://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
