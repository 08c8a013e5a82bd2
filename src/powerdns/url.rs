//! Normalization of user-supplied server addresses.
use ::url::{ParseError, Url};

use crate::error::{Error, Result};

/// Scheme used when the address carries none (or one we don't speak).
pub const DEFAULT_SCHEME: &str = "https";

/// Reduce an address to `<scheme>://<host>[:port]`, without path or trailing slash.
///
/// A bare `host:port` is read by URL parsers as scheme `host`; such addresses fall
/// back to [`DEFAULT_SCHEME`] and are parsed again with that scheme prefixed.
pub fn sanitize_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::invalid_address("no URL provided"));
    }

    let parsed = match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(ParseError::RelativeUrlWithoutBase) => None,
        Err(err) => {
            return Err(Error::invalid_address(format!(
                "unable to parse '{raw}': {err}"
            )));
        }
    };

    let scheme = match &parsed {
        Some(url) if matches!(url.scheme(), "http" | "https") => url.scheme().to_string(),
        _ => DEFAULT_SCHEME.to_string(),
    };

    if let Some(host) = parsed.as_ref().and_then(|url| authority(raw, url)) {
        return Ok(format!("{scheme}://{host}"));
    }

    let retry = format!("{scheme}://{raw}");
    let host = Url::parse(&retry)
        .ok()
        .and_then(|url| authority(&retry, &url))
        .ok_or_else(|| Error::invalid_address(format!("unable to find a hostname in '{raw}'")))?;

    Ok(format!("{scheme}://{host}"))
}

/// Host and port as written in `source`, if `url` has a host at all.
///
/// `Url` drops ports equal to the scheme default, so the authority is cut from the
/// text instead of being rebuilt from the parsed parts.
fn authority(source: &str, url: &Url) -> Option<String> {
    url.host_str().filter(|h| !h.is_empty())?;

    let rest = source
        .get(url.scheme().len() + 1..)?
        .trim_start_matches(['/', '\\']);
    let end = rest.find(['/', '?', '#', '\\']).unwrap_or(rest.len());
    let authority = &rest[..end];
    let authority = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);

    (!authority.is_empty()).then(|| authority.to_string())
}
