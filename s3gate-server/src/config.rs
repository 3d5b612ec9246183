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

//! Configuration management for the gateway.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Origin backend selection.
    pub origin: OriginConfig,
    /// Static gateway credentials.
    pub auth: AuthConfig,
    /// Request limits.
    pub limits: LimitsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080".
    /// Can be set via the S3GATE_BIND environment variable.
    pub bind: String,
}

/// Which backend the gateway proxies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    /// Local directory tree.
    Fs,
    /// Remote S3 bucket.
    S3,
    /// Google Cloud Storage bucket.
    Gcs,
    /// Cloudflare R2 bucket.
    R2,
}

impl FromStr for OriginKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fs" => Ok(OriginKind::Fs),
            "s3" => Ok(OriginKind::S3),
            "gcs" => Ok(OriginKind::Gcs),
            "r2" => Ok(OriginKind::R2),
            other => Err(format!("unknown origin kind: {other}")),
        }
    }
}

/// Origin backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Backend selector.
    /// Can be set via the S3GATE_ORIGIN environment variable.
    pub kind: OriginKind,
    /// Data root for `fs`, bucket name for the remote kinds.
    /// Can be set via the S3GATE_ORIGIN_ROOT environment variable.
    pub root: String,
}

/// Static credential pair the gateway authenticates against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Access key ID.
    /// Can be set via the S3GATE_ACCESS_KEY_ID environment variable.
    pub access_key_id: String,
    /// Secret access key.
    /// Can be set via the S3GATE_SECRET_ACCESS_KEY environment variable.
    pub secret_access_key: String,
    /// Region the credential is scoped to, and what GetBucketLocation
    /// reports for the fs origin.
    /// Can be set via the S3GATE_REGION environment variable.
    pub region: String,
}

/// Request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes; 0 disables the cap.
    /// Can be set via S3GATE_MAX_BODY_SIZE (supports "512KB"/"64MB"/"1GB").
    pub max_body_size: u32,
    /// Seconds allowed for reading a request body.
    /// Can be set via the S3GATE_READ_BODY_TIMEOUT_SECS environment variable.
    pub read_body_timeout_secs: u64,
}

/// Parses a size string like "1GB", "100MB", "1024KB", "5000" into bytes.
pub fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim().to_uppercase();
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let num_end = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(num_end);
    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number: {num_str}"))?;

    let multiplier: u64 = match suffix.trim() {
        "GB" | "G" => 1024 * 1024 * 1024,
        "MB" | "M" => 1024 * 1024,
        "KB" | "K" => 1024,
        "B" | "" => 1,
        other => return Err(format!("unknown size suffix: {other}")),
    };

    let bytes = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size overflows: {s}"))?;
    u32::try_from(bytes).map_err(|_| format!("size does not fit in 32 bits: {s}"))
}

impl Config {
    /// Loads configuration from environment variables over the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("S3GATE_BIND") {
            config.server.bind = bind;
        }
        if let Ok(kind) = std::env::var("S3GATE_ORIGIN") {
            config.origin.kind = kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
        }
        if let Ok(root) = std::env::var("S3GATE_ORIGIN_ROOT") {
            config.origin.root = root;
        }
        if let Ok(key) = std::env::var("S3GATE_ACCESS_KEY_ID") {
            config.auth.access_key_id = key;
        }
        if let Ok(secret) = std::env::var("S3GATE_SECRET_ACCESS_KEY") {
            config.auth.secret_access_key = secret;
        }
        if let Ok(region) = std::env::var("S3GATE_REGION") {
            config.auth.region = region;
        }
        if let Ok(size) = std::env::var("S3GATE_MAX_BODY_SIZE") {
            config.limits.max_body_size =
                parse_size(&size).map_err(|e| anyhow::anyhow!(e))?;
        }
        if let Ok(secs) = std::env::var("S3GATE_READ_BODY_TIMEOUT_SECS") {
            config.limits.read_body_timeout_secs = secs
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid S3GATE_READ_BODY_TIMEOUT_SECS: {secs}"))?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:8080".to_string(),
            },
            origin: OriginConfig {
                kind: OriginKind::Fs,
                root: std::env::temp_dir()
                    .join("s3gate-data")
                    .to_string_lossy()
                    .into_owned(),
            },
            auth: AuthConfig {
                access_key_id: String::new(),
                secret_access_key: String::new(),
                region: "us-east-1".to_string(),
            },
            limits: LimitsConfig {
                max_body_size: 0,
                read_body_timeout_secs: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_plain_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn parse_size_suffixes() {
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("100mb").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1TB").is_err());
        // u32 overflow
        assert!(parse_size("5GB").is_err());
    }

    #[test]
    fn origin_kind_from_str() {
        assert_eq!("fs".parse::<OriginKind>().unwrap(), OriginKind::Fs);
        assert_eq!("r2".parse::<OriginKind>().unwrap(), OriginKind::R2);
        assert!("ftp".parse::<OriginKind>().is_err());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.origin.kind, OriginKind::Fs);
        assert_eq!(config.limits.max_body_size, 0);
        assert_eq!(config.limits.read_body_timeout_secs, 60);
        assert_eq!(config.auth.region, "us-east-1");
    }
}
