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

//! Request authentication.

pub mod canonical;
pub mod chunked;
pub mod signature_v4;

/// Credential lookup consumed by the SigV4 verifier.
///
/// Returning `None` signals an unknown access key, which surfaces as
/// `InvalidAccessKeyId` on the wire.
pub trait SecretKeys: Send + Sync {
    /// Returns the secret for `access_key` in `region`, if it exists.
    fn secret_key(&self, access_key: &str, region: &str) -> Option<String>;
}

/// A single static credential pair, valid in one region.
#[derive(Debug, Clone)]
pub struct StaticKeys {
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl StaticKeys {
    /// Creates a credential provider for one access-key/secret pair.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }
}

impl SecretKeys for StaticKeys {
    fn secret_key(&self, access_key: &str, region: &str) -> Option<String> {
        if access_key == self.access_key_id && region == self.region {
            Some(self.secret_access_key.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_keys_lookup() {
        let keys = StaticKeys::new("AK", "secret", "us-east-1");
        assert_eq!(keys.secret_key("AK", "us-east-1").as_deref(), Some("secret"));
        assert_eq!(keys.secret_key("AK", "eu-west-1"), None);
        assert_eq!(keys.secret_key("OTHER", "us-east-1"), None);
    }
}
