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

//! Entity-tag normalization.
//!
//! ETags travel double-quoted on the wire and unquoted in comparisons.
//! Quoting is guarded by a prefix check so already-quoted values are left
//! alone even when both the middleware and a handler normalize them.

/// Ensures `s` carries surrounding double quotes.
pub fn add_etag_quotes(s: &str) -> String {
    if s.starts_with('"') {
        s.to_string()
    } else {
        format!("\"{s}\"")
    }
}

/// Removes surrounding double quotes, if both are present.
pub fn strip_etag_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Compares two etags ignoring quoting on either side.
pub fn etags_match(a: &str, b: &str) -> bool {
    strip_etag_quotes(a) == strip_etag_quotes(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_is_idempotent() {
        assert_eq!(add_etag_quotes("abc"), "\"abc\"");
        assert_eq!(add_etag_quotes("\"abc\""), "\"abc\"");
        assert_eq!(add_etag_quotes(&add_etag_quotes("abc")), "\"abc\"");
    }

    #[test]
    fn stripping() {
        assert_eq!(strip_etag_quotes("\"abc\""), "abc");
        assert_eq!(strip_etag_quotes("abc"), "abc");
        assert_eq!(strip_etag_quotes("\"abc"), "\"abc");
        assert_eq!(strip_etag_quotes("\""), "\"");
    }

    #[test]
    fn matching_ignores_quotes() {
        assert!(etags_match("\"abc\"", "abc"));
        assert!(etags_match("abc", "\"abc\""));
        assert!(!etags_match("abc", "def"));
    }
}
