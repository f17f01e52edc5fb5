//! TC3-HMAC-SHA256 request signing

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

/// Inputs of one signature
pub struct SigningRequest<'a> {
    pub secret_id: &'a str,
    pub secret_key: &'a str,
    pub service: &'a str,
    pub host: &'a str,
    pub payload: &'a [u8],
    pub timestamp: DateTime<Utc>,
}

impl SigningRequest<'_> {
    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        let date = self.timestamp.format("%Y-%m-%d").to_string();
        let scope = format!("{}/{}/tc3_request", date, self.service);

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            self.timestamp.timestamp(),
            scope,
            sha256_hex(self.canonical_request().as_bytes())
        );

        let secret_date = hmac_sha256(format!("TC3{}", self.secret_key).as_bytes(), &date);
        let secret_service = hmac_sha256(&secret_date, self.service);
        let secret_signing = hmac_sha256(&secret_service, "tc3_request");
        let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign));

        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.secret_id, scope, SIGNED_HEADERS, signature
        )
    }

    fn canonical_request(&self) -> String {
        format!(
            "POST\n/\n\ncontent-type:{}\nhost:{}\n\n{}\n{}",
            CONTENT_TYPE,
            self.host,
            SIGNED_HEADERS,
            sha256_hex(self.payload)
        )
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], message: &str) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac key length is unrestricted"),
    };
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
