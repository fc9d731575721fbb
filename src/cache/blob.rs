use std::fs;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::info;
use sha2::{Digest, Sha256};

use crate::errors::ReplicaError;

type HmacSha256 = Hmac<Sha256>;

/// Identifies one object in remote blob storage.
#[derive(Debug, Clone)]
pub struct ReplicaLocation {
    pub bucket: String,
    pub key: String,
    pub region: String,
}

/// Downloads a blob to a local file.
///
/// Abstracted so replica freshness can be tested with a scripted fetcher.
#[async_trait]
pub trait BlobFetch: Send + Sync {
    async fn fetch(&self, location: &ReplicaLocation, dest: &Path) -> Result<(), ReplicaError>;
}

/// Fetches objects from S3-compatible storage over plain HTTPS.
///
/// Requests are signed with AWS Signature V4 when the standard credential
/// environment variables are present, and sent unsigned (public bucket)
/// otherwise.
pub struct S3BlobClient {
    client: reqwest::Client,
}

impl S3BlobClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = crate::http::build_client("MakerVersusStats/1.0", timeout_secs)?;
        Ok(Self { client })
    }

    fn object_url(location: &ReplicaLocation) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            location.bucket,
            location.region,
            encode_key(&location.key)
        )
    }
}

#[async_trait]
impl BlobFetch for S3BlobClient {
    async fn fetch(&self, location: &ReplicaLocation, dest: &Path) -> Result<(), ReplicaError> {
        let url = Self::object_url(location);
        info!("Downloading replica from {}", url);

        let mut request = self.client.get(&url);
        if let Some(credentials) = Credentials::from_env() {
            for (name, value) in sign_get_request(&credentials, location, Utc::now()) {
                request = request.header(name, value);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReplicaError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplicaError::Unavailable(format!(
                "download returned status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReplicaError::Unavailable(e.to_string()))?;

        write_atomic(dest, &bytes)
            .map_err(|e| ReplicaError::Unavailable(format!("failed to write local file: {}", e)))?;

        info!("Replica downloaded to {}", dest.display());
        Ok(())
    }
}

// Write via a sibling temp file and rename, so a crashed download never
// leaves a half-written replica behind.
fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, dest)
}

struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    fn from_env() -> Option<Self> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        Some(Self {
            access_key,
            secret_key,
        })
    }
}

/// AWS Signature V4 headers for a GET with an empty payload.
fn sign_get_request(
    credentials: &Credentials,
    location: &ReplicaLocation,
    now: DateTime<Utc>,
) -> Vec<(String, String)> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let host = format!("{}.s3.{}.amazonaws.com", location.bucket, location.region);
    let payload_hash = sha256_hex(b"");

    let canonical_uri = format!("/{}", encode_key(&location.key));
    let canonical_headers = format!(
        "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
        host, payload_hash, amz_date
    );
    let signed_headers = "host;x-amz-content-sha256;x-amz-date";
    let canonical_request = format!(
        "GET\n{}\n\n{}\n{}\n{}",
        canonical_uri, canonical_headers, signed_headers, payload_hash
    );

    let scope = format!("{}/{}/s3/aws4_request", date_stamp, location.region);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(&credentials.secret_key, &date_stamp, &location.region);
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        credentials.access_key, scope, signed_headers, signature
    );

    vec![
        ("x-amz-date".to_string(), amz_date),
        ("x-amz-content-sha256".to_string(), payload_hash),
        ("authorization".to_string(), authorization),
    ]
}

fn derive_signing_key(secret_key: &str, date_stamp: &str, region: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, b"s3");
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// URI-encode an object key, keeping path separators intact.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn location() -> ReplicaLocation {
        ReplicaLocation {
            bucket: "stats-backups".to_string(),
            key: "replicas/versus stats.db".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn encodes_key_preserving_separators() {
        assert_eq!(
            encode_key("replicas/versus stats.db"),
            "replicas/versus%20stats.db"
        );
        assert_eq!(encode_key("plain-key_1.db"), "plain-key_1.db");
    }

    #[test]
    fn object_url_targets_virtual_hosted_bucket() {
        assert_eq!(
            S3BlobClient::object_url(&location()),
            "https://stats-backups.s3.us-east-1.amazonaws.com/replicas/versus%20stats.db"
        );
    }

    #[test]
    fn signed_headers_carry_scope_and_signature() {
        let credentials = Credentials {
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "secret".to_string(),
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let headers = sign_get_request(&credentials, &location(), now);

        assert_eq!(headers[0], ("x-amz-date".to_string(), "20240601T120000Z".to_string()));
        let auth = &headers[2].1;
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240601/us-east-1/s3/aws4_request"));
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));
        assert!(auth.contains("Signature="));
    }

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let credentials = Credentials {
            access_key: "AKIDEXAMPLE".to_string(),
            secret_key: "secret".to_string(),
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let first = sign_get_request(&credentials, &location(), now);
        let second = sign_get_request(&credentials, &location(), now);
        assert_eq!(first, second);
    }
}
