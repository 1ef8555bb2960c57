//! MinIO / S3 client
//!
//! Downloads objects with path-style `GET /{bucket}/{key}` requests, signed
//! with SigV4 when credentials are configured.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use tracing::debug;

use super::sigv4::{self, Credentials, EMPTY_PAYLOAD_SHA256};
use super::{BackendError, ObjectStore};
use crate::config::MinioConfig;

// == Minio Store ==
/// HTTP client for a MinIO or other S3-compatible server.
#[derive(Debug, Clone)]
pub struct MinioStore {
    client: reqwest::Client,
    /// `scheme://host[:port]`
    base_url: String,
    /// Host header value, as the server will see it
    host: String,
    region: String,
    credentials: Option<Credentials>,
}

impl MinioStore {
    /// Builds a client from connection settings.
    pub fn new(config: &MinioConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        let scheme = if config.use_ssl { "https" } else { "http" };
        let host = normalize_host(&config.endpoint, config.use_ssl);

        Ok(Self {
            client,
            base_url: format!("{}://{}", scheme, host),
            host,
            region: config.region.clone(),
            credentials: Credentials::from_parts(&config.access_key, &config.secret_key),
        })
    }
}

/// Strips the scheme, trailing slashes and default ports, which reqwest
/// leaves out of the Host header.
fn normalize_host(endpoint: &str, use_ssl: bool) -> String {
    let host = endpoint
        .trim()
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');

    let default_port = if use_ssl { ":443" } else { ":80" };
    host.strip_suffix(default_port).unwrap_or(host).to_string()
}

/// Percent-encodes each path segment and keeps the separators.
fn object_path(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}/{}", urlencoding::encode(bucket), encoded_key)
}

#[async_trait]
impl ObjectStore for MinioStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BackendError> {
        let path = object_path(bucket, key);
        let mut request = self.client.get(format!("{}{}", self.base_url, path));

        if let Some(credentials) = &self.credentials {
            let now = Utc::now();
            let date = sigv4::amz_date(now);

            let mut headers = BTreeMap::new();
            headers.insert("host".to_string(), self.host.clone());
            headers.insert("x-amz-content-sha256".to_string(), EMPTY_PAYLOAD_SHA256.to_string());
            headers.insert("x-amz-date".to_string(), date.clone());

            let auth = sigv4::authorization(
                credentials,
                &self.region,
                "s3",
                "GET",
                &path,
                &headers,
                EMPTY_PAYLOAD_SHA256,
                now,
            );

            request = request
                .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
                .header("x-amz-date", date)
                .header(AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| BackendError::Transient(e.to_string()))?;
                debug!(bucket, key, size = body.len(), "Successfully got the object");
                Ok(body)
            }
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(key.to_string())),
            status => Err(BackendError::Transient(format!(
                "unexpected status {} for {}",
                status, path
            ))),
        }
    }
}
