//! URL origin extraction and detail-page URL resolution.

/// Extracts the scheme+host origin from an absolute URL.
///
/// Given `"https://basalam.com/p/16078271"`, returns `"https://basalam.com"`.
#[must_use]
pub fn extract_origin(url: &str) -> String {
    reqwest::Url::parse(url).map_or_else(
        |e| {
            tracing::warn!(
                url,
                error = %e,
                "could not parse URL, falling back to string split for origin extraction"
            );
            url.trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for use in log fields.
///
/// Falls back to the full URL string if parsing fails.
pub(super) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// Resolves the detail-page URL for a listing.
///
/// Short links of the form `<origin>/p/<id>` need the vendor slug and become
/// `<origin>/<vendor>/product/<id>`. Any other absolute http(s) link is
/// already a detail URL and passes through unchanged.
///
/// Returns `None` when the link is empty or unparseable, or when a short
/// link cannot be expanded because `vendor_name` is empty.
#[must_use]
pub fn resolve_detail_url(link: &str, vendor_name: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    let parsed = reqwest::Url::parse(link).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["p", id] => {
            let vendor = vendor_name.trim();
            if vendor.is_empty() {
                return None;
            }
            Some(format!(
                "{}/{vendor}/product/{id}",
                parsed.origin().ascii_serialization()
            ))
        }
        _ => Some(link.to_owned()),
    }
}
