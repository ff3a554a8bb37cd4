//! Header handling on both legs of the forward.
//!
//! `host` never goes upstream. Framing headers (`content-length`,
//! `transfer-encoding`) describe the body as it was received; the body that
//! actually goes out may be re-serialized, so hyper recomputes them.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

fn is_framing(name: &HeaderName) -> bool {
    name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING
}

/// Build the header map sent upstream.
///
/// Every inbound header except `host` and framing headers is copied. A header
/// present several times is joined into one value separated by `", "`.
pub fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.keys_len());

    for name in inbound.keys() {
        if name == header::HOST || is_framing(name) {
            continue;
        }

        match join_values(inbound, name) {
            Some(value) => {
                outbound.insert(name.clone(), value);
            }
            None => {
                tracing::warn!(header = %name, "Dropping header that cannot be joined");
            }
        }
    }

    outbound
}

/// Strip framing headers from an upstream response before its body is re-emitted.
pub fn strip_framing(headers: &mut HeaderMap) {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
}

fn join_values(headers: &HeaderMap, name: &HeaderName) -> Option<HeaderValue> {
    let mut values = headers.get_all(name).iter();
    let first = values.next()?;

    let mut joined: Option<Vec<u8>> = None;
    for value in values {
        let buf = joined.get_or_insert_with(|| first.as_bytes().to_vec());
        buf.extend_from_slice(b", ");
        buf.extend_from_slice(value.as_bytes());
    }

    match joined {
        None => Some(first.clone()),
        Some(buf) => {
            let mut value = HeaderValue::from_bytes(&buf).ok()?;
            value.set_sensitive(first.is_sensitive());
            Some(value)
        }
    }
}
