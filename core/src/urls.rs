use percent_encoding::percent_decode_str;
use url::Url;

/// Extensions that mark a URL as binary/media/document content we never fetch.
const FORBIDDEN_EXTENSIONS: &[&str] = &[
    ".exe", ".apk", ".msi",
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2",
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico",
    ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx",
    ".xml", ".rss", ".mht", ".mhtml",
];

/// Archive mirrors; crawling snapshots would duplicate the live pages.
const FORBIDDEN_HOSTS: &[&str] = &[
    "web.archive.org",
    "archive.org",
    "archive.today",
    "archive.ph",
    "webcache.googleusercontent.com",
];

/// Storage/display form of a URL: the query string is dropped, the remainder
/// is percent-decoded, and one trailing slash is stripped.
pub fn canonicalize(raw: &str) -> String {
    let without_query = match raw.split_once('?') {
        Some((head, _)) => head,
        None => raw,
    };
    let decoded = percent_decode_str(without_query).decode_utf8_lossy();
    let trimmed = decoded.strip_suffix('/').unwrap_or(&decoded);
    trimmed.to_string()
}

/// Dedup form of a canonical URL. Never used for fetching or storage: two
/// URLs differing only by scheme or case collapse to the same identity.
pub fn identity_of(canonical: &str) -> String {
    let rest = canonical
        .strip_prefix("http://")
        .or_else(|| canonical.strip_prefix("https://"))
        .unwrap_or(canonical);
    rest.to_lowercase()
}

pub fn has_forbidden_extension(url: &str) -> bool {
    let lower = url.to_lowercase();
    FORBIDDEN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// An unparseable URL is not forbidden; it fails at fetch time instead.
pub fn is_forbidden_host(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    FORBIDDEN_HOSTS
        .iter()
        .any(|f| host == *f || host.ends_with(&format!(".{f}")))
}
