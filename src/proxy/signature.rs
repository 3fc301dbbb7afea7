use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Requests older than this are treated as replays.
const MAX_REQUEST_AGE_SECS: i64 = 300;
/// Tolerated clock skew for requests stamped in the future.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

const VERSION_PREFIX: &str = "v0=";

/// MAC over Slack's `v0:{timestamp}:{body}` base string.
fn base_string_mac(
    timestamp: &str,
    request_body: &str,
    signing_secret: &str,
) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return None;
        }
    };
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(request_body.as_bytes());
    Some(mac)
}

/// The `X-Slack-Signature` value Slack would send for this request.
pub fn compute_signature(timestamp: &str, request_body: &str, signing_secret: &str) -> String {
    base_string_mac(timestamp, request_body, signing_secret)
        .map(|mac| format!("{VERSION_PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
        .unwrap_or_default()
}

/// Within the replay window, without overflowing on extreme timestamps.
fn is_fresh(ts: i64, now_secs: i64) -> bool {
    if ts <= now_secs {
        now_secs.abs_diff(ts) <= MAX_REQUEST_AGE_SECS.unsigned_abs()
    } else {
        ts.abs_diff(now_secs) <= MAX_CLOCK_SKEW_SECS.unsigned_abs()
    }
}

/// Check a Slack `v0` request signature against `now_secs`.
pub fn verify_slack_signature_at(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
    now_secs: i64,
) -> bool {
    let Ok(ts) = timestamp.trim().parse::<i64>() else {
        error!("Unparseable X-Slack-Request-Timestamp: {}", timestamp);
        return false;
    };

    if !is_fresh(ts, now_secs) {
        error!("Timestamp out of range, potential replay attack");
        return false;
    }

    let Some(expected) = signature
        .strip_prefix(VERSION_PREFIX)
        .and_then(|digest| hex::decode(digest).ok())
    else {
        error!("Malformed X-Slack-Signature");
        return false;
    };

    let verified = base_string_mac(timestamp, request_body, signing_secret)
        .is_some_and(|mac| mac.verify_slice(&expected).is_ok());
    if !verified {
        error!("Slack signature verification failed");
    }
    verified
}

pub fn verify_slack_signature(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
) -> bool {
    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    verify_slack_signature_at(request_body, timestamp, signature, signing_secret, now_secs)
}
