//! Shared credential profiles (`<dir>/<profile>.credential` and `.configure`)

use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Profile used when none is named
pub const DEFAULT_PROFILE: &str = "default";

/// Directory under the home directory holding the profiles
pub const DEFAULT_PROFILE_DIR: &str = ".tccli";

/// Profile type that requires OAuth federation
pub const OAUTH_PROFILE_TYPE: &str = "oauth";

/// Resolved paths of one named profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLocation {
    pub name: String,
    pub dir: PathBuf,
}

impl ProfileLocation {
    /// `dir` of `None` selects `~/.tccli`; a leading `~` is expanded
    pub fn new(name: Option<&str>, dir: Option<&str>) -> Result<Self> {
        let name = name.unwrap_or(DEFAULT_PROFILE).to_string();
        let dir = match dir {
            Some(dir) => expand_home(dir)?,
            None => dirs::home_dir()
                .ok_or(AuthError::HomeDirNotFound)?
                .join(DEFAULT_PROFILE_DIR),
        };
        Ok(Self { name, dir })
    }

    pub fn credential_path(&self) -> PathBuf {
        self.dir.join(format!("{}.credential", self.name))
    }

    pub fn configure_path(&self) -> PathBuf {
        self.dir.join(format!("{}.configure", self.name))
    }

    /// Load the credential file, `Ok(None)` when it does not exist
    pub fn load_credential(&self) -> Result<Option<ProfileCredential>> {
        let Some(mut credential) = read_json::<ProfileCredential>(&self.credential_path())? else {
            return Ok(None);
        };
        credential.trim();
        Ok(Some(credential))
    }

    /// Region from the configure file, `Ok(None)` when the file or key is absent
    pub fn load_region(&self) -> Result<Option<String>> {
        let configure = read_json::<ConfigureFile>(&self.configure_path())?;
        Ok(configure
            .and_then(|c| c.sys_param.region)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()))
    }
}

fn expand_home(dir: &str) -> Result<PathBuf> {
    if dir == "~" {
        return dirs::home_dir().ok_or(AuthError::HomeDirNotFound);
    }
    if let Some(rest) = dir.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(AuthError::HomeDirNotFound)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(dir))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    tracing::debug!("loading profile file {}", path.display());
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| AuthError::ProfileParse {
            path: path.to_path_buf(),
            source,
        })
}

/// `<profile>.credential`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileCredential {
    #[serde(rename = "type")]
    pub kind: String,
    pub secret_id: String,
    pub secret_key: String,
    #[serde(alias = "securityToken")]
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
    #[serde(rename = "role-arn")]
    pub role_arn: String,
    #[serde(rename = "role-session-name")]
    pub role_session_name: String,
    #[serde(rename = "role-session-duration", deserialize_with = "lenient_u64")]
    pub role_session_duration: u64,
    pub oauth: Option<OauthBlock>,
}

impl ProfileCredential {
    pub fn is_oauth(&self) -> bool {
        self.kind == OAUTH_PROFILE_TYPE
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        unix_time(self.expires_at)
    }

    fn trim(&mut self) {
        for field in [
            &mut self.secret_id,
            &mut self.secret_key,
            &mut self.token,
            &mut self.role_arn,
            &mut self.role_session_name,
        ] {
            *field = field.trim().to_string();
        }
    }
}

/// OAuth section of an `oauth` profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OauthBlock {
    pub open_id: String,
    pub access_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub refresh_token: String,
    pub site: String,
}

impl OauthBlock {
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        unix_time(self.expires_at)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigureFile {
    #[serde(rename = "_sys_param", default)]
    sys_param: SysParam,
}

#[derive(Debug, Default, Deserialize)]
struct SysParam {
    #[serde(default)]
    region: Option<String>,
}

pub(crate) fn unix_time(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        None
    } else {
        DateTime::from_timestamp(secs, 0)
    }
}

/// Accepts `3600`, `"3600"`, `""` and `null`
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(NumberOrString::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
