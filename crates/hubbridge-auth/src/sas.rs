//! Shared access signature generation.
//!
//! A token authorises access to one resource URI until its expiry:
//!
//! ```text
//! SharedAccessSignature sr=<encodedUri>&sig=<encodedSig>&se=<expiry>&skn=<keyName>
//! ```
//!
//! where `sig` is `base64(HMAC-SHA256(key, "<encodedUri>\n<expiry>"))`,
//! percent-encoded.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::Sha256;
use tracing::debug;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Characters left untouched when encoding a URI component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SCHEME: &str = "SharedAccessSignature ";

// ---------------------------------------------------------------------------
// SasToken
// ---------------------------------------------------------------------------

/// A signed, time-limited authorization token.
///
/// Built fresh for every negotiation and never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct SasToken {
    value: String,
    expiry: i64,
}

impl SasToken {
    /// The full token text, including the `SharedAccessSignature` scheme.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Expiry as unix seconds.
    pub fn expiry(&self) -> i64 {
        self.expiry
    }

    /// Consume the token, returning its text.
    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SasToken")
            .field("value", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Signer capability
// ---------------------------------------------------------------------------

/// Something that can produce a [`SasToken`].
///
/// The negotiator receives a signer rather than calling [`sign`] directly so
/// that tests can pin the clock.
pub trait TokenSigner: Send + Sync {
    /// Sign `resource_uri` with the base64 `key`, valid for `validity_minutes`.
    fn sign(
        &self,
        resource_uri: &str,
        key: &str,
        key_name: &str,
        validity_minutes: u32,
    ) -> Result<SasToken, AuthError>;
}

/// [`TokenSigner`] that reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedAccessSigner;

impl TokenSigner for SharedAccessSigner {
    fn sign(
        &self,
        resource_uri: &str,
        key: &str,
        key_name: &str,
        validity_minutes: u32,
    ) -> Result<SasToken, AuthError> {
        sign(resource_uri, key, key_name, validity_minutes)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sign a token that expires `validity_minutes` from now.
pub fn sign(
    resource_uri: &str,
    key: &str,
    key_name: &str,
    validity_minutes: u32,
) -> Result<SasToken, AuthError> {
    sign_at(resource_uri, key, key_name, validity_minutes, Utc::now())
}

/// Sign a token as if the current time were `now`.
///
/// # Arguments
///
/// * `resource_uri` — Host/path the token is scoped to (percent-encoded here).
/// * `key` — Shared access key, standard base64.
/// * `key_name` — Shared access policy name, emitted as `skn`.
/// * `validity_minutes` — Lifetime of the token; must be non-zero.
/// * `now` — Clock reading; sub-second parts round the expiry up.
pub fn sign_at(
    resource_uri: &str,
    key: &str,
    key_name: &str,
    validity_minutes: u32,
    now: DateTime<Utc>,
) -> Result<SasToken, AuthError> {
    if resource_uri.is_empty() {
        return Err(AuthError::InvalidInput("resource URI must not be empty".into()));
    }
    if validity_minutes == 0 {
        return Err(AuthError::InvalidInput(
            "token validity must be at least one minute".into(),
        ));
    }

    let key_bytes = STANDARD.decode(key)?;
    let encoded_uri = encode_component(resource_uri);
    let expiry = (now.timestamp_millis() + 999).div_euclid(1000) + i64::from(validity_minutes) * 60;
    let digest = compute_signature(&key_bytes, &encoded_uri, expiry);
    let encoded_sig = encode_component(&STANDARD.encode(digest));

    debug!(resource = %encoded_uri, expiry, key_name, "SAS token signed");

    Ok(SasToken {
        value: format!("{SCHEME}sr={encoded_uri}&sig={encoded_sig}&se={expiry}&skn={key_name}"),
        expiry,
    })
}

/// Check that a token's `sig` matches its `sr` and `se` fields under `key`.
///
/// Returns `Ok(false)` on a signature mismatch, and an error when the token
/// is not in the expected form or the key is not base64.
pub fn verify(token: &str, key: &str) -> Result<bool, AuthError> {
    let key_bytes = STANDARD.decode(key)?;
    let fields = token
        .strip_prefix(SCHEME)
        .ok_or_else(|| AuthError::InvalidInput("missing SharedAccessSignature scheme".into()))?;

    let mut resource = None;
    let mut signature = None;
    let mut expiry = None;
    for pair in fields.split('&') {
        match pair.split_once('=') {
            Some(("sr", v)) => resource = Some(v),
            Some(("sig", v)) => signature = Some(v),
            Some(("se", v)) => expiry = Some(v),
            _ => {}
        }
    }

    let (Some(resource), Some(signature), Some(expiry)) = (resource, signature, expiry) else {
        return Err(AuthError::InvalidInput("token lacks sr, sig or se".into()));
    };
    let expiry: i64 = expiry
        .parse()
        .map_err(|_| AuthError::InvalidInput(format!("non-numeric expiry: {expiry}")))?;
    let signature = percent_decode_str(signature)
        .decode_utf8()
        .map_err(|e| AuthError::InvalidInput(e.to_string()))?;
    let signature = STANDARD.decode(signature.as_bytes())?;

    let mut mac = new_mac(&key_bytes);
    mac.update(signing_input(resource, expiry).as_bytes());
    Ok(mac.verify_slice(&signature).is_ok())
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Percent-encode everything except the URI-component unreserved set.
fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

fn signing_input(encoded_uri: &str, expiry: i64) -> String {
    format!("{encoded_uri}\n{expiry}")
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size")
}

fn compute_signature(key: &[u8], encoded_uri: &str, expiry: i64) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(signing_input(encoded_uri, expiry).as_bytes());
    mac.finalize().into_bytes().to_vec()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const KEY: &str = "S2V5MTIz";
    const URI: &str = "my-iothub.example-devices.net/messages/events";

    fn at(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, millis * 1_000_000).unwrap()
    }

    fn field<'a>(token: &'a SasToken, name: &str) -> &'a str {
        token
            .as_str()
            .strip_prefix(SCHEME)
            .unwrap()
            .split('&')
            .find_map(|pair| pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
            .unwrap()
    }

    #[test]
    fn token_has_expected_layout() {
        let token = sign_at(URI, KEY, "MyPolicy", 5, at(1_700_000_000, 0)).unwrap();
        assert!(token.as_str().starts_with(
            "SharedAccessSignature sr=my-iothub.example-devices.net%2Fmessages%2Fevents&sig="
        ));
        assert!(token.as_str().ends_with("&se=1700000300&skn=MyPolicy"));
    }

    #[test]
    fn expiry_is_now_plus_validity() {
        let token = sign_at(URI, KEY, "p", 5, at(1_700_000_000, 0)).unwrap();
        assert_eq!(token.expiry(), 1_700_000_000 + 5 * 60);
        assert_eq!(field(&token, "se"), "1700000300");
    }

    #[test]
    fn sub_second_clock_rounds_expiry_up() {
        let token = sign_at(URI, KEY, "p", 1, at(1_700_000_000, 400)).unwrap();
        assert_eq!(token.expiry(), 1_700_000_001 + 60);
    }

    #[test]
    fn signature_is_hmac_over_encoded_uri_and_expiry() {
        let token = sign_at(URI, KEY, "p", 5, at(1_700_000_000, 0)).unwrap();

        let mut mac = HmacSha256::new_from_slice(b"Key123").unwrap();
        mac.update(b"my-iothub.example-devices.net%2Fmessages%2Fevents\n1700000300");
        let expected = encode_component(&STANDARD.encode(mac.finalize().into_bytes()));

        assert_eq!(field(&token, "sig"), expected);
        assert!(verify(token.as_str(), KEY).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let token = sign_at(URI, KEY, "p", 5, at(1_700_000_000, 0)).unwrap();
        assert!(!verify(token.as_str(), "b3RoZXI=").unwrap());
    }

    #[test]
    fn verify_rejects_tampered_expiry() {
        let token = sign_at(URI, KEY, "p", 5, at(1_700_000_000, 0)).unwrap();
        let tampered = token.as_str().replace("se=1700000300", "se=1800000300");
        assert!(!verify(&tampered, KEY).unwrap());
    }

    #[test]
    fn resigning_later_changes_the_token() {
        let first = sign_at(URI, KEY, "p", 5, at(1_700_000_000, 0)).unwrap();
        let second = sign_at(URI, KEY, "p", 5, at(1_700_000_060, 0)).unwrap();
        assert_ne!(first, second);
        assert_eq!(second.expiry() - first.expiry(), 60);
    }

    #[test]
    fn wall_clock_signer_expiry_is_close_to_now() {
        let before = Utc::now().timestamp();
        let token = SharedAccessSigner.sign(URI, KEY, "p", 5).unwrap();
        let after = Utc::now().timestamp();
        assert!(token.expiry() >= before + 300);
        assert!(token.expiry() <= after + 301);
    }

    #[test]
    fn invalid_base64_key_is_rejected() {
        let err = sign_at(URI, "not base64!", "p", 5, at(0, 0)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[test]
    fn zero_validity_is_rejected() {
        let err = sign_at(URI, KEY, "p", 0, at(0, 0)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[test]
    fn empty_resource_is_rejected() {
        let err = sign_at("", KEY, "p", 5, at(0, 0)).unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[test]
    fn component_encoding_keeps_unreserved_set() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_component("a+b/c=d e"), "a%2Bb%2Fc%3Dd%20e");
    }

    #[test]
    fn debug_redacts_token_value() {
        let token = sign_at(URI, KEY, "p", 5, at(1_700_000_000, 0)).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("sig="));
        assert!(debug.contains("1700000300"));
    }
}
