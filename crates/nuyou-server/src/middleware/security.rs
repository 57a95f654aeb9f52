//! Response headers set on everything the server returns.
//!
//! Pages, uploads and the API share one origin, and the editing toolbar only
//! calls back into `/api`, so every source is pinned to `'self'`. The
//! exceptions are images (upload previews use `data:` and `blob:` URLs) and
//! inline styles, which the toolbar injects. Forms may only post back here
//! and nothing may frame the site.

use axum::http::HeaderValue;
use axum::http::header::HeaderName;
use tower_http::set_header::SetResponseHeaderLayer;

const CSP: &str = "default-src 'self'; \
                   script-src 'self'; \
                   style-src 'self' 'unsafe-inline'; \
                   font-src 'self' data:; \
                   img-src 'self' data: blob:; \
                   connect-src 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'none'";

/// Header name and value pairs, in the order they are layered.
const HEADERS: [(&str, &str); 3] = [
    ("content-security-policy", CSP),
    // Uploads are served with their sniffed type; browsers must not guess
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
];

/// One overriding layer per header.
pub(crate) fn header_layers() -> impl Iterator<Item = SetResponseHeaderLayer<HeaderValue>> {
    HEADERS.into_iter().map(|(name, value)| {
        SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        )
    })
}
