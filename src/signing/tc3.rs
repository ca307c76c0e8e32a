//! Canonical request construction and the triple-HMAC key chain.

use super::Credential;
use crate::error::{AsrError, Result};
use chrono::DateTime;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const SECRET_PREFIX: &str = "TC3";
pub const REQUEST_SUFFIX: &str = "tc3_request";
pub const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Everything that participates in a signature.
///
/// Built fresh for each outbound call; the timestamp and payload it carries
/// are the ones actually sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub http_method: String,
    pub uri_path: String,
    pub query_string: String,
    pub content_type: String,
    pub host: String,
    pub action: String,
    pub timestamp: i64,
    pub payload: String,
}

impl SigningRequest {
    /// A `POST /` request with a JSON body, the only shape the ASR API uses.
    pub fn post_json(
        host: impl Into<String>,
        action: impl Into<String>,
        timestamp: i64,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            http_method: "POST".to_string(),
            uri_path: "/".to_string(),
            query_string: String::new(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            host: host.into(),
            action: action.into(),
            timestamp,
            payload: payload.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.action.trim().is_empty() {
            return Err(AsrError::Signing("action name is empty".to_string()));
        }
        if self.http_method.trim().is_empty() {
            return Err(AsrError::Signing("HTTP method is empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(AsrError::Signing("host header is empty".to_string()));
        }
        Ok(())
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], msg: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AsrError::Signing(format!("invalid HMAC key: {}", e)))?;
    mac.update(msg.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// UTC calendar date (`YYYY-MM-DD`) of the request timestamp.
pub fn utc_date(timestamp: i64) -> Result<String> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .ok_or_else(|| AsrError::Signing(format!("timestamp {} is out of range", timestamp)))
}

/// `date/service/tc3_request`.
pub fn credential_scope(date: &str, service_name: &str) -> String {
    format!("{}/{}/{}", date, service_name, REQUEST_SUFFIX)
}

/// Canonical request string as the verifier rebuilds it.
pub fn canonical_request(request: &SigningRequest) -> String {
    let canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-tc-action:{}\n",
        request.content_type,
        request.host,
        request.action.to_lowercase()
    );

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.http_method,
        request.uri_path,
        request.query_string,
        canonical_headers,
        SIGNED_HEADERS,
        sha256_hex(request.payload.as_bytes())
    )
}

/// String-to-sign for a request under the given credential scope.
pub fn string_to_sign(request: &SigningRequest, scope: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        request.timestamp,
        scope,
        sha256_hex(canonical_request(request).as_bytes())
    )
}

/// Compute the `Authorization` header value for `request`.
///
/// Fails only on malformed input, which is a configuration problem and never retryable.
pub fn sign(credential: &Credential, request: &SigningRequest) -> Result<String> {
    request.validate()?;
    if credential.service_name.is_empty() {
        return Err(AsrError::Signing("service name is empty".to_string()));
    }

    let date = utc_date(request.timestamp)?;
    let scope = credential_scope(&date, &credential.service_name);
    let to_sign = string_to_sign(request, &scope);

    let secret = format!("{}{}", SECRET_PREFIX, credential.access_secret);
    let date_key = hmac_sha256(secret.as_bytes(), &date)?;
    let service_key = hmac_sha256(&date_key, &credential.service_name)?;
    let signing_key = hmac_sha256(&service_key, REQUEST_SUFFIX)?;
    let signature = hex::encode(hmac_sha256(&signing_key, &to_sign)?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credential.access_id, scope, SIGNED_HEADERS, signature
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "asr.tencentcloudapi.com";
    const TS: i64 = 1_700_000_000;

    fn credential() -> Credential {
        Credential::new("AKIDEXAMPLE", "SECRETEXAMPLE", "ap-guangzhou", "asr")
    }

    fn request() -> SigningRequest {
        SigningRequest::post_json(HOST, "DescribeTaskStatus", TS, r#"{"TaskId":1234}"#)
    }

    #[test]
    fn test_known_signature() {
        let header = sign(&credential(), &request()).unwrap();
        assert_eq!(
            header,
            "TC3-HMAC-SHA256 Credential=AKIDEXAMPLE/2023-11-14/asr/tc3_request, \
             SignedHeaders=content-type;host;x-tc-action, \
             Signature=2570ffc285f1141f7f95da5eff7c69c4c762d836f97ec25ee705baccb6ac9aa5"
        );
    }

    #[test]
    fn test_canonical_request_layout() {
        let canonical = canonical_request(&request());
        assert_eq!(
            canonical,
            "POST\n/\n\n\
             content-type:application/json; charset=utf-8\n\
             host:asr.tencentcloudapi.com\n\
             x-tc-action:describetaskstatus\n\n\
             content-type;host;x-tc-action\n\
             8b76918785219fc23f4160b57959038e7dfb8a87ffe64118d56e205ed05796c4"
        );
        assert_eq!(
            sha256_hex(canonical.as_bytes()),
            "f481c34a2c9ff4a2a8f4e76533cc3d34b5756dc363a5a12ee2d522a87f97e87e"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let a = sign(&credential(), &request()).unwrap();
        let b = sign(&credential(), &request()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_field_change_alters_signature() {
        let base = sign(&credential(), &request()).unwrap();

        let mut method = request();
        method.http_method = "GET".to_string();

        let mut payload = request();
        payload.payload = r#"{"TaskId":1235}"#.to_string();

        let mut timestamp = request();
        timestamp.timestamp = TS + 1;

        let mut action = request();
        action.action = "CreateRecTask".to_string();

        for changed in [method, payload, timestamp, action] {
            assert_ne!(sign(&credential(), &changed).unwrap(), base);
        }
    }

    #[test]
    fn test_action_case_does_not_matter() {
        let mut lower = request();
        lower.action = "describetaskstatus".to_string();
        assert_eq!(
            sign(&credential(), &lower).unwrap(),
            sign(&credential(), &request()).unwrap()
        );
    }

    #[test]
    fn test_date_comes_from_timestamp() {
        assert_eq!(utc_date(0).unwrap(), "1970-01-01");
        // 23:59:59 UTC on 2023-11-14 stays on the 14th regardless of local time.
        assert_eq!(utc_date(1_700_006_399).unwrap(), "2023-11-14");
        assert_eq!(utc_date(1_700_006_400).unwrap(), "2023-11-15");
    }

    #[test]
    fn test_empty_action_is_signing_error() {
        let mut bad = request();
        bad.action = "  ".to_string();
        let err = sign(&credential(), &bad).unwrap_err();
        assert!(matches!(err, AsrError::Signing(_)));
        assert!(!err.kind().is_retryable());
    }
}
