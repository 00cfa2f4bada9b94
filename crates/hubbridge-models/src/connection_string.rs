//! Connection strings on both sides of the conversion.
//!
//! The input is a device-registry connection string:
//!
//! ```text
//! HostName=<host>;SharedAccessKeyName=<policy>;SharedAccessKey=<base64-secret>
//! ```
//!
//! The output is a broker-compatible connection string:
//!
//! ```text
//! Endpoint=sb://<host>/;EntityPath=<path>;SharedAccessKeyName=<policy>;SharedAccessKey=<base64-secret>
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ModelError;

const HOST_NAME: &str = "HostName";
const SHARED_ACCESS_KEY_NAME: &str = "SharedAccessKeyName";
const SHARED_ACCESS_KEY: &str = "SharedAccessKey";

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Signing credentials taken from the input connection string.
///
/// The key is kept in its base64 text form; only the token signer decodes
/// it. `Debug` output redacts the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    resource_host: String,
    key_name: String,
    key: String,
}

impl Credential {
    /// Create a new `Credential`.
    pub fn new(
        resource_host: impl Into<String>,
        key_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            resource_host: resource_host.into(),
            key_name: key_name.into(),
            key: key.into(),
        }
    }

    /// Host of the device registry (e.g. `my-hub.example-devices.net`).
    pub fn resource_host(&self) -> &str {
        &self.resource_host
    }

    /// Shared access policy name.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Shared access key, base64-encoded.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("resource_host", &self.resource_host)
            .field("key_name", &self.key_name)
            .field("key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// IotHubConnectionString
// ---------------------------------------------------------------------------

/// Parsed device-registry connection string.
///
/// # Examples
///
/// ```
/// use hubbridge_models::IotHubConnectionString;
///
/// let cs: IotHubConnectionString =
///     "HostName=my-hub.example-devices.net;SharedAccessKeyName=service;SharedAccessKey=S2V5MTIz"
///         .parse()
///         .unwrap();
/// assert_eq!(cs.credential().resource_host(), "my-hub.example-devices.net");
/// assert_eq!(cs.credential().key(), "S2V5MTIz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IotHubConnectionString {
    credential: Credential,
}

impl IotHubConnectionString {
    /// Borrow the credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Consume the connection string, keeping only the credential.
    pub fn into_credential(self) -> Credential {
        self.credential
    }
}

impl FromStr for IotHubConnectionString {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut host = None;
        let mut key_name = None;
        let mut key = None;

        for segment in s.split(';') {
            if segment.trim().is_empty() {
                continue;
            }
            // Split on the first `=` only: base64 keys end in `=` padding.
            let (name, value) =
                segment
                    .split_once('=')
                    .ok_or_else(|| ModelError::MalformedSegment {
                        segment: segment.to_string(),
                    })?;
            let value = value.trim();
            match name.trim() {
                HOST_NAME => host = Some(value),
                SHARED_ACCESS_KEY_NAME => key_name = Some(value),
                SHARED_ACCESS_KEY => key = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            credential: Credential::new(
                required(host, HOST_NAME)?,
                required(key_name, SHARED_ACCESS_KEY_NAME)?,
                required(key, SHARED_ACCESS_KEY)?,
            ),
        })
    }
}

impl From<IotHubConnectionString> for Credential {
    fn from(cs: IotHubConnectionString) -> Self {
        cs.credential
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ModelError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ModelError::MissingField {
            field: field.to_string(),
        })
}

// ---------------------------------------------------------------------------
// EventHubConnectionString
// ---------------------------------------------------------------------------

/// Broker-compatible connection string, the result of a conversion.
///
/// # Examples
///
/// ```
/// use hubbridge_models::EventHubConnectionString;
///
/// let cs = EventHubConnectionString::new("broker.example.net", "myhub", "policy", "c2VjcmV0");
/// assert_eq!(
///     cs.to_string(),
///     "Endpoint=sb://broker.example.net/;EntityPath=myhub;SharedAccessKeyName=policy;SharedAccessKey=c2VjcmV0",
/// );
/// ```
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventHubConnectionString {
    endpoint_host: String,
    entity_path: String,
    key_name: String,
    #[serde(skip_serializing)]
    key: String,
}

impl EventHubConnectionString {
    /// Create a new `EventHubConnectionString`.
    pub fn new(
        endpoint_host: impl Into<String>,
        entity_path: impl Into<String>,
        key_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_host: endpoint_host.into(),
            entity_path: entity_path.into(),
            key_name: key_name.into(),
            key: key.into(),
        }
    }

    /// Broker namespace host.
    pub fn endpoint_host(&self) -> &str {
        &self.endpoint_host
    }

    /// Entity path on the broker.
    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }

    /// Shared access policy name.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Shared access key, base64-encoded.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for EventHubConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Endpoint=sb://{}/;EntityPath={};{SHARED_ACCESS_KEY_NAME}={};{SHARED_ACCESS_KEY}={}",
            self.endpoint_host, self.entity_path, self.key_name, self.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str =
        "HostName=my-iothub.example-devices.net;SharedAccessKeyName=MyPolicy;SharedAccessKey=S2V5MTIz";

    #[test]
    fn parses_required_fields() {
        let cs: IotHubConnectionString = INPUT.parse().unwrap();
        let credential = cs.credential();
        assert_eq!(credential.resource_host(), "my-iothub.example-devices.net");
        assert_eq!(credential.key_name(), "MyPolicy");
        assert_eq!(credential.key(), "S2V5MTIz");
    }

    #[test]
    fn keeps_base64_padding_in_key() {
        let cs: IotHubConnectionString =
            "HostName=h.example.net;SharedAccessKeyName=p;SharedAccessKey=a2V5==".parse().unwrap();
        assert_eq!(cs.credential().key(), "a2V5==");
    }

    #[test]
    fn tolerates_trailing_separator_whitespace_and_unknown_keys() {
        let cs: IotHubConnectionString =
            " HostName = h.example.net ; DeviceId=dev1;SharedAccessKeyName=p;SharedAccessKey=a2V5;"
                .parse()
                .unwrap();
        assert_eq!(cs.credential().resource_host(), "h.example.net");
        assert_eq!(cs.credential().key_name(), "p");
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = "HostName=h.example.net;SharedAccessKeyName=p"
            .parse::<IotHubConnectionString>()
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingField {
                field: "SharedAccessKey".into()
            }
        );
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let err = "HostName=;SharedAccessKeyName=p;SharedAccessKey=a2V5"
            .parse::<IotHubConnectionString>()
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingField {
                field: "HostName".into()
            }
        );
    }

    #[test]
    fn segment_without_equals_is_malformed() {
        let err = "HostName=h.example.net;garbage;SharedAccessKeyName=p;SharedAccessKey=a2V5"
            .parse::<IotHubConnectionString>()
            .unwrap_err();
        assert!(matches!(err, ModelError::MalformedSegment { segment } if segment == "garbage"));
    }

    #[test]
    fn credential_debug_redacts_key() {
        let credential = Credential::new("h.example.net", "p", "super-secret");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn output_format_is_exact() {
        let cs = EventHubConnectionString::new(
            "my-iothub-ns.servicebus.example.net",
            "my-iothub",
            "MyPolicy",
            "S2V5MTIz",
        );
        assert_eq!(
            cs.to_string(),
            "Endpoint=sb://my-iothub-ns.servicebus.example.net/;EntityPath=my-iothub;SharedAccessKeyName=MyPolicy;SharedAccessKey=S2V5MTIz"
        );
    }

    #[test]
    fn json_output_omits_key() {
        let cs = EventHubConnectionString::new("broker.example.net", "hub", "p", "c2VjcmV0");
        let json = serde_json::to_value(&cs).unwrap();
        assert_eq!(json["endpointHost"], "broker.example.net");
        assert_eq!(json["entityPath"], "hub");
        assert_eq!(json["keyName"], "p");
        assert!(json.get("key").is_none());
    }
}
