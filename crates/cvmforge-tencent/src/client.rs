//! Signed JSON-over-HTTPS client shared by every service

use crate::sign::{CONTENT_TYPE, SigningRequest};
use chrono::Utc;
use cvmforge_auth::{Credential, ServiceTarget};
use cvmforge_cloud::{CloudError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout applied to every call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const ROOT_DOMAIN: &str = "tencentcloudapi.com";
const LANGUAGE: &str = "en-US";

/// Service name and API version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    pub name: &'static str,
    pub version: &'static str,
}

pub const CVM: Service = Service {
    name: "cvm",
    version: "2017-03-12",
};
pub const VPC: Service = Service {
    name: "vpc",
    version: "2017-03-12",
};
pub const STS: Service = Service {
    name: "sts",
    version: "2018-08-13",
};
pub const CAM: Service = Service {
    name: "cam",
    version: "2019-01-16",
};
pub const ORGANIZATION: Service = Service {
    name: "organization",
    version: "2021-03-31",
};

/// One service client bound to a credential and region
pub struct TencentClient {
    http: reqwest::Client,
    service: Service,
    credential: Credential,
    region: String,
    scheme: String,
    host: String,
}

impl TencentClient {
    pub fn new(service: Service, target: ServiceTarget<'_>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CloudError::Network(e.to_string()))?;
        let (scheme, host) = split_endpoint(service, target.endpoint);

        Ok(Self {
            http,
            service,
            credential: target.credential.clone(),
            region: target.region.to_string(),
            scheme,
            host,
        })
    }

    /// POST `request` as `action` and decode the `Response` body
    pub async fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;
        let timestamp = Utc::now();
        let authorization = SigningRequest {
            secret_id: &self.credential.secret_id,
            secret_key: &self.credential.secret_key,
            service: self.service.name,
            host: &self.host,
            payload: &payload,
            timestamp,
        }
        .authorization();

        tracing::debug!(
            service = self.service.name,
            region = %self.region,
            "{}",
            action
        );

        let mut builder = self
            .http
            .post(format!("{}://{}/", self.scheme, self.host))
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-TC-Action", action)
            .header("X-TC-Version", self.service.version)
            .header("X-TC-Timestamp", timestamp.timestamp().to_string())
            .header("X-TC-Region", &self.region)
            .header("X-TC-Language", LANGUAGE);
        if let Some(token) = &self.credential.token {
            builder = builder.header("X-TC-Token", token);
        }

        let response = builder
            .body(payload)
            .send()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CloudError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(CloudError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        decode_response(&body)
    }
}

/// `(scheme, host)` for a service, honoring a custom endpoint with or
/// without a scheme
pub(crate) fn split_endpoint(service: Service, endpoint: Option<&str>) -> (String, String) {
    let Some(endpoint) = endpoint.map(str::trim).filter(|e| !e.is_empty()) else {
        return (
            "https".to_string(),
            format!("{}.{}", service.name, ROOT_DOMAIN),
        );
    };

    match endpoint.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split('/').next().unwrap_or(rest);
            (scheme.to_string(), host.to_string())
        }
        None => ("https".to_string(), endpoint.trim_end_matches('/').to_string()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    response: serde_json::Value,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct ErrorBody {
    code: String,
    message: String,
}

pub(crate) fn decode_response<Resp: DeserializeOwned>(body: &str) -> Result<Resp> {
    let Envelope { response } = serde_json::from_str(body)?;

    if let Some(error) = response.get("Error") {
        let error: ErrorBody = serde_json::from_value(error.clone())?;
        let request_id = response
            .get("RequestId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(CloudError::Api {
            code: error.code,
            message: error.message,
            request_id,
        });
    }

    Ok(serde_json::from_value(response)?)
}
