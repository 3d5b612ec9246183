// Copyright 2026 S3Gate Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Canonical forms mandated by AWS Signature V4.
//!
//! Signing is bit-exact: every byte of the canonical request must match what
//! third-party SDKs produce, so URI and query canonicalization decode each
//! component exactly once and re-encode with upper-hex percent escapes.
//!
//! The bucket-name validator also lives here; the router fallback and the
//! handlers share it.

use axum::http::HeaderMap;

/// Returns whether `name` is a well-formed bucket name:
/// `[A-Za-z0-9._-]{1,255}`.
pub fn is_valid_bucket_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// Percent-encodes every byte except the RFC 3986 unreserved set
/// (`A-Z a-z 0-9 - _ . ~`). `/` is encoded too; URI canonicalization keeps
/// it by encoding segment-by-segment.
pub fn uri_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    encoded
}

/// Decodes `%XX` escapes; malformed escapes are kept verbatim.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decodes an `application/x-www-form-urlencoded` component
/// (`+` means space).
pub fn form_decode(s: &str) -> String {
    percent_decode(&s.replace('+', " "))
}

/// Canonicalizes a request path.
///
/// Each segment is decoded once and re-encoded; `/` separators are
/// preserved, never encoded. An empty path canonicalizes to `/`.
pub fn canonicalize_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| uri_encode(&percent_decode(segment)))
        .collect();
    let joined = encoded.join("/");

    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

/// Canonicalizes a query string.
///
/// Parameters are decoded once, re-encoded (including any `=` in values),
/// sorted bytewise by encoded name with ties broken by encoded value, and
/// joined with `&`. A parameter without a value renders as `name=`.
pub fn canonicalize_query(query: Option<&str>) -> String {
    let query = query.unwrap_or("");
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(String, String)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let name = uri_encode(&percent_decode(parts.next().unwrap_or("")));
            let value = uri_encode(&percent_decode(parts.next().unwrap_or("")));
            (name, value)
        })
        .collect();

    params.sort();

    let encoded: Vec<String> = params.iter().map(|(n, v)| format!("{n}={v}")).collect();
    encoded.join("&")
}

/// Builds the canonical headers block, one `name:value\n` line per signed
/// header in the given (sorted, lowercase) order. Internal whitespace runs
/// collapse to single spaces; `host` is substituted with the request
/// authority. The returned block keeps its trailing newline.
pub fn canonical_headers(headers: &HeaderMap, authority: &str, signed: &[String]) -> String {
    let mut block = String::new();
    for name in signed {
        block.push_str(name);
        block.push(':');
        if name == "host" {
            block.push_str(authority);
        } else {
            let value = headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            let collapsed = value.split_whitespace().collect::<Vec<&str>>().join(" ");
            block.push_str(&collapsed);
        }
        block.push('\n');
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bucket_name_validation() {
        assert!(is_valid_bucket_name("photos"));
        assert!(is_valid_bucket_name("my-bucket.v2_backup"));
        assert!(is_valid_bucket_name(&"a".repeat(255)));
        assert!(!is_valid_bucket_name(""));
        assert!(!is_valid_bucket_name(&"a".repeat(256)));
        assert!(!is_valid_bucket_name("has space"));
        assert!(!is_valid_bucket_name("sl/ash"));
    }

    #[test]
    fn uri_encode_unreserved_passthrough() {
        assert_eq!(uri_encode("AZaz09-_.~"), "AZaz09-_.~");
        assert_eq!(uri_encode("hello world"), "hello%20world");
        assert_eq!(uri_encode("a/b"), "a%2Fb");
        assert_eq!(uri_encode("a=b&c"), "a%3Db%26c");
        assert_eq!(uri_encode("100%"), "100%25");
    }

    #[test]
    fn percent_decode_roundtrip() {
        assert_eq!(percent_decode("hello%20world"), "hello world");
        assert_eq!(percent_decode("a%2Fb"), "a/b");
        // double encoding decodes one layer only
        assert_eq!(percent_decode("a%2520b"), "a%20b");
        // malformed escapes survive
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn canonical_uri_basics() {
        assert_eq!(canonicalize_uri(""), "/");
        assert_eq!(canonicalize_uri("/"), "/");
        assert_eq!(canonicalize_uri("/bucket"), "/bucket");
        assert_eq!(canonicalize_uri("/bucket/key"), "/bucket/key");
        assert_eq!(canonicalize_uri("/bucket/my key"), "/bucket/my%20key");
        // pre-encoded input is not double-encoded
        assert_eq!(canonicalize_uri("/bucket/my%20key"), "/bucket/my%20key");
        // empty segments (double slashes) are preserved
        assert_eq!(canonicalize_uri("/a//b"), "/a//b");
        // trailing slash is preserved
        assert_eq!(canonicalize_uri("/bucket/"), "/bucket/");
    }

    #[test]
    fn canonical_uri_is_idempotent() {
        for path in ["/a b/c~d", "/bucket/%28x%29", "/a//", "/%E2%98%83"] {
            let once = canonicalize_uri(path);
            assert_eq!(canonicalize_uri(&once), once, "path: {path}");
        }
    }

    #[test]
    fn canonical_query_sorting_and_encoding() {
        assert_eq!(canonicalize_query(None), "");
        assert_eq!(canonicalize_query(Some("")), "");
        assert_eq!(canonicalize_query(Some("b=2&a=1")), "a=1&b=2");
        assert_eq!(canonicalize_query(Some("delete")), "delete=");
        assert_eq!(canonicalize_query(Some("prefix=a%20b")), "prefix=a%20b");
        // '=' inside a value is encoded
        assert_eq!(canonicalize_query(Some("k=a=b")), "k=a%3Db");
        // ties broken by value
        assert_eq!(canonicalize_query(Some("k=2&k=1")), "k=1&k=2");
    }

    #[test]
    fn canonical_query_is_idempotent() {
        for q in ["b=2&a=1", "delete", "prefix=a%20b&marker="] {
            let once = canonicalize_query(Some(q));
            assert_eq!(canonicalize_query(Some(&once)), once, "query: {q}");
        }
    }

    #[test]
    fn canonical_headers_block() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("ignored.example.com"));
        headers.insert("x-amz-date", HeaderValue::from_static("20130524T000000Z"));
        headers.insert(
            "x-amz-meta-note",
            HeaderValue::from_static("  padded   and  spaced  "),
        );

        let signed = vec![
            "host".to_string(),
            "x-amz-date".to_string(),
            "x-amz-meta-note".to_string(),
        ];
        let block = canonical_headers(&headers, "bucket.example.com:9000", &signed);
        assert_eq!(
            block,
            "host:bucket.example.com:9000\nx-amz-date:20130524T000000Z\nx-amz-meta-note:padded and spaced\n"
        );
    }
}
