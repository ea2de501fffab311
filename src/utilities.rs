pub struct Utilities;

impl Utilities {
    /// Root of the backend derived from the API base, with a trailing
    /// `/api/v1` or `/api` segment removed.
    pub fn static_base_url(api_base_url: &str) -> String {
        let trimmed = api_base_url.trim_end_matches('/');
        trimmed
            .strip_suffix("/api/v1")
            .or_else(|| trimmed.strip_suffix("/api"))
            .unwrap_or(trimmed)
            .to_string()
    }

    /// Joins a request path onto the base URL. Absolute URLs are returned
    /// unchanged; otherwise exactly one `/` separates base and path.
    pub fn combine_url(base_url: &str, path: &str) -> String {
        if Self::is_absolute_url(path) {
            return path.to_string();
        }
        if path.is_empty() {
            return base_url.to_string();
        }
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn is_absolute_url(path: &str) -> bool {
        let Some((scheme, _)) = path.split_once("://") else {
            return path.starts_with("//");
        };
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }
}
