//! URL validation and manipulation utilities.
//!
//! Links read off crawled pages are attacker-influenced. Everything that enters
//! the working dataset passes through [`sanitize_url`] first.

use thiserror::Error;
use url::Url;

use super::constants::ALLOWED_HOSTS;

/// Why a URL was refused by [`sanitize_url`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUrlError {
    #[error("malformed URL: {0}")]
    Malformed(String),

    #[error("scheme '{0}' is not https")]
    Scheme(String),

    #[error("host '{0}' is not in the allow-list")]
    Host(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("explicit port {0} is not allowed")]
    Port(u16),

    #[error("URL carries userinfo")]
    Userinfo,

    #[error("URL carries a fragment")]
    Fragment,
}

/// Validate a discovered URL against the host allow-list.
///
/// Checks run in order and stop at the first failure: parse, `https` scheme,
/// allowed host, default port, no userinfo, no fragment. On success the input
/// is returned untouched; nothing is rewritten.
///
/// # Examples
/// ```
/// use kodegen_tools_channelscout::utils::sanitize_url;
///
/// let url = "https://www.youtube.com/watch?v=abc";
/// assert_eq!(sanitize_url(url).unwrap(), url);
/// assert!(sanitize_url("http://www.youtube.com/watch?v=abc").is_err());
/// ```
pub fn sanitize_url(raw: &str) -> Result<String, InvalidUrlError> {
    let parsed = Url::parse(raw).map_err(|e| InvalidUrlError::Malformed(e.to_string()))?;

    if parsed.scheme() != "https" {
        return Err(InvalidUrlError::Scheme(parsed.scheme().to_string()));
    }

    let host = parsed.host_str().ok_or(InvalidUrlError::MissingHost)?;
    if !ALLOWED_HOSTS.contains(&host) {
        return Err(InvalidUrlError::Host(host.to_string()));
    }

    // Url drops a default port, so `:443` is only visible in the raw text
    if let Some(port) = parsed.port() {
        return Err(InvalidUrlError::Port(port));
    }
    if authority_has_port(raw) {
        return Err(InvalidUrlError::Port(
            parsed.port_or_known_default().unwrap_or_default(),
        ));
    }

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(InvalidUrlError::Userinfo);
    }

    if parsed.fragment().is_some() {
        return Err(InvalidUrlError::Fragment);
    }

    Ok(raw.to_string())
}

fn authority_has_port(raw: &str) -> bool {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    host_port.contains(':')
}

/// Origin of a URL as `scheme://host`, the unit robots.txt applies to
pub fn origin_of(url: &str) -> Result<String, InvalidUrlError> {
    let parsed = Url::parse(url).map_err(|e| InvalidUrlError::Malformed(e.to_string()))?;
    let host = parsed.host_str().ok_or(InvalidUrlError::MissingHost)?;
    Ok(format!("{}://{}", parsed.scheme(), host))
}

/// Path plus query of a URL, the part robots rules are matched against
pub fn robots_path_of(url: &str) -> Result<String, InvalidUrlError> {
    let parsed = Url::parse(url).map_err(|e| InvalidUrlError::Malformed(e.to_string()))?;
    let path = if parsed.path().is_empty() {
        "/"
    } else {
        parsed.path()
    };
    Ok(match parsed.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    })
}
