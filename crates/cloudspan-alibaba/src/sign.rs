//! ACS3-HMAC-SHA256 request signing for RPC-style APIs
//!
//! Parameters travel in the query string and the body is empty, so the
//! payload hash is always the hash of the empty string.

use crate::error::{AlibabaError, Result};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// Hash of an empty payload
pub const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// RFC 3986 unreserved characters stay literal.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}

/// Sorted, encoded `k=v&...` query string.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// One RPC call to sign
#[derive(Debug, Clone)]
pub struct RpcRequest<'a> {
    pub host: &'a str,
    pub action: &'a str,
    pub version: &'a str,
    pub params: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Signed {
    /// Encoded query string, without the leading `?`
    pub query: String,
    /// Signed headers plus `authorization`, lowercase names
    pub headers: Vec<(String, String)>,
}

/// Signs `request` with a fixed timestamp (`%Y-%m-%dT%H:%M:%SZ`) and nonce.
pub fn sign(
    request: &RpcRequest<'_>,
    access_key_id: &str,
    access_key_secret: &str,
    date: &str,
    nonce: &str,
) -> Result<Signed> {
    let query = canonical_query(request.params);

    // BTreeMap keeps header names sorted
    let headers: BTreeMap<&str, &str> = BTreeMap::from([
        ("host", request.host),
        ("x-acs-action", request.action),
        ("x-acs-content-sha256", EMPTY_PAYLOAD_HASH),
        ("x-acs-date", date),
        ("x-acs-signature-nonce", nonce),
        ("x-acs-version", request.version),
    ]);
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{k}:{}\n", v.trim()))
        .collect();
    let signed_headers = headers.keys().copied().collect::<Vec<_>>().join(";");

    let canonical_request = format!(
        "POST\n/\n{query}\n{canonical_headers}\n{signed_headers}\n{EMPTY_PAYLOAD_HASH}"
    );
    let string_to_sign = format!("{ALGORITHM}\n{}", sha256_hex(&canonical_request));

    let mut mac = HmacSha256::new_from_slice(access_key_secret.as_bytes())
        .map_err(|e| AlibabaError::Signing(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let mut out: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    out.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={access_key_id},SignedHeaders={signed_headers},Signature={signature}"
        ),
    ));

    Ok(Signed {
        query,
        headers: out,
    })
}
