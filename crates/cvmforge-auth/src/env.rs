//! Environment variable source
//!
//! The resolver never calls `std::env::var` directly; it reads an
//! [`Environment`] snapshot so tests can hand it an explicit map.

use std::collections::HashMap;

pub const SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
pub const SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
pub const SECURITY_TOKEN: &str = "TENCENTCLOUD_SECURITY_TOKEN";
pub const REGION: &str = "TENCENTCLOUD_REGION";
pub const ASSUME_ROLE_ARN: &str = "TENCENTCLOUD_ASSUME_ROLE_ARN";
pub const ASSUME_ROLE_SESSION_NAME: &str = "TENCENTCLOUD_ASSUME_ROLE_SESSION_NAME";
pub const ASSUME_ROLE_SESSION_DURATION: &str = "TENCENTCLOUD_ASSUME_ROLE_SESSION_DURATION";
pub const PROFILE: &str = "TENCENTCLOUD_PROFILE";
pub const SHARED_CREDENTIALS_DIR: &str = "TENCENTCLOUD_SHARED_CREDENTIALS_DIR";

const ALL: &[&str] = &[
    SECRET_ID,
    SECRET_KEY,
    SECURITY_TOKEN,
    REGION,
    ASSUME_ROLE_ARN,
    ASSUME_ROLE_SESSION_NAME,
    ASSUME_ROLE_SESSION_DURATION,
    PROFILE,
    SHARED_CREDENTIALS_DIR,
];

/// Snapshot of the variables the resolver understands
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        let vars = ALL
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed value, `None` when unset or blank
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
