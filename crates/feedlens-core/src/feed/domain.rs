use url::Url;

use crate::{Error, Result};

/// Extract the host (plus an explicit port) from a feed or article URL.
///
/// Strings without an `http://` or `https://` prefix are parsed as if they
/// had `http://` in front.
pub fn get_domain(url: &str) -> Result<String> {
    let url = url.trim();
    let parsed = if url.starts_with("http://") || url.starts_with("https://") {
        Url::parse(url)
    } else {
        Url::parse(&format!("http://{}", url))
    }
    .map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Display label for a feed: its domain, or the raw URL when none can be derived
pub fn source_label(feed_url: &str) -> String {
    match get_domain(feed_url) {
        Ok(domain) => domain,
        Err(e) => {
            tracing::debug!("Falling back to raw URL as label: {}", e);
            feed_url.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_with_scheme() {
        assert_eq!(get_domain("https://a.example.com/x").unwrap(), "a.example.com");
        assert_eq!(get_domain("http://blog.example.org/feed.xml?x=1").unwrap(), "blog.example.org");
    }

    #[test]
    fn test_domain_without_scheme() {
        assert_eq!(get_domain("a.example.com/x").unwrap(), "a.example.com");
    }

    #[test]
    fn test_domain_keeps_explicit_port() {
        assert_eq!(get_domain("http://localhost:8080/rss").unwrap(), "localhost:8080");
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(get_domain("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(get_domain(""), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_source_label_falls_back_to_raw() {
        assert_eq!(source_label("https://www.ruanyifeng.com/blog/atom.xml"), "www.ruanyifeng.com");
        assert_eq!(source_label("not a url"), "not a url");
    }
}
