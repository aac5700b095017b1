/// Prefixes `url` with `http://` when `no_tls`, else `https://`.
///
/// A URL that already carries a scheme is returned unchanged.
pub fn with_scheme(url: &str, no_tls: bool) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    let scheme = if no_tls { "http" } else { "https" };
    format!("{scheme}://{url}")
}
