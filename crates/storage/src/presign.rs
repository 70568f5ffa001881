//! SigV4 signing of S3 browser-based POST uploads.
//!
//! `aws-sdk-s3` only presigns single requests, so the POST policy document
//! is assembled here and signed with the `aws-sigv4` primitives:
//!
//! 1. Build the policy JSON (expiration + conditions).
//! 2. Base64-encode it; the encoded string is the string to sign.
//! 3. Derive the date/region/service signing key.
//! 4. The signature is the hex HMAC of the encoded policy under that key.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use aws_sigv4::sign::v4::{calculate_signature, generate_signing_key};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::{PostCondition, PresignPostRequest, PresignedPost};

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const TERMINATOR: &str = "aws4_request";

/// Resolved credentials used to sign one policy.
#[derive(Clone)]
pub struct SigningCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Build and sign a POST form for `request`, posting to `url`.
pub fn build_presigned_post(
    request: &PresignPostRequest,
    credentials: &SigningCredentials,
    region: &str,
    url: String,
    now: DateTime<Utc>,
) -> PresignedPost {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let credential = format!(
        "{}/{date_stamp}/{region}/{SERVICE}/{TERMINATOR}",
        credentials.access_key_id
    );

    let mut fields: BTreeMap<String, String> = request.fields.clone();
    fields.insert("key".into(), request.key.clone());
    fields.insert("x-amz-algorithm".into(), ALGORITHM.into());
    fields.insert("x-amz-credential".into(), credential.clone());
    fields.insert("x-amz-date".into(), amz_date.clone());

    let mut conditions: Vec<serde_json::Value> =
        request.conditions.iter().map(PostCondition::to_json).collect();
    conditions.push(PostCondition::equals("bucket", &request.bucket).to_json());
    conditions.push(PostCondition::equals("key", &request.key).to_json());
    conditions.push(PostCondition::equals("x-amz-algorithm", ALGORITHM).to_json());
    conditions.push(PostCondition::equals("x-amz-credential", credential).to_json());
    conditions.push(PostCondition::equals("x-amz-date", amz_date).to_json());

    if let Some(token) = &credentials.session_token {
        fields.insert("x-amz-security-token".into(), token.clone());
        conditions.push(PostCondition::equals("x-amz-security-token", token).to_json());
    }

    let policy = serde_json::json!({
        "expiration": policy_expiration(now, request.expires_in),
        "conditions": conditions,
    });
    let policy_b64 = BASE64.encode(policy.to_string());

    let signing_key = generate_signing_key(
        &credentials.secret_access_key,
        SystemTime::from(now),
        region,
        SERVICE,
    );
    let signature = calculate_signature(signing_key, policy_b64.as_bytes());

    fields.insert("policy".into(), policy_b64);
    fields.insert("x-amz-signature".into(), signature);

    PresignedPost { url, fields }
}

fn policy_expiration(now: DateTime<Utc>, expires_in: Duration) -> String {
    let expires_in = chrono::Duration::from_std(expires_in).unwrap_or(chrono::Duration::zero());
    (now + expires_in).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
