//! Canonical names used during negotiation.
//!
//! Every host-derived string the negotiator sends (token scope, SASL
//! username, link address) is built here so the naming convention lives in
//! one place.
//!
//! ```text
//! <host>/messages/events                       ← token resource URI
//! <keyName>@sas.root.<registry>                ← SASL username
//! amqps://<host>/messages/events/$management   ← receiving-link address
//! ```

/// Standard TLS port of the broker protocol.
pub const AMQPS_PORT: u16 = 5671;

/// Link error condition that carries the redirect payload.
pub const REDIRECT_CONDITION: &str = "amqp:link:redirect";

/// Lifetime of the token presented during negotiation.
pub const TOKEN_VALIDITY_MINUTES: u32 = 5;

const SCHEME: &str = "amqps";
const EVENTS_PATH: &str = "messages/events";

/// Central authority for the names derived from a registry host.
///
/// # Examples
///
/// ```
/// use hubbridge_sdk::HubAddresses;
///
/// let host = "my-hub.example-devices.net";
/// assert_eq!(HubAddresses::resource_uri(host), "my-hub.example-devices.net/messages/events");
/// assert_eq!(
///     HubAddresses::management_address(host),
///     "amqps://my-hub.example-devices.net/messages/events/$management",
/// );
/// assert_eq!(HubAddresses::registry_name(host), Some("my-hub"));
/// assert_eq!(HubAddresses::sas_username("service", "my-hub"), "service@sas.root.my-hub");
/// ```
pub struct HubAddresses;

impl HubAddresses {
    /// Resource URI the negotiation token is scoped to.
    pub fn resource_uri(host: &str) -> String {
        format!("{host}/{EVENTS_PATH}")
    }

    /// Address of the management receiving link.
    ///
    /// The registry answers an attach on this address with a redirect to
    /// the entity's own broker, which is what the negotiation is after.
    pub fn management_address(host: &str) -> String {
        format!("{SCHEME}://{host}/{EVENTS_PATH}/$management")
    }

    /// Registry name: the first dot-delimited label of the host.
    ///
    /// Returns `None` when that label is empty.
    pub fn registry_name(host: &str) -> Option<&str> {
        host.split('.').next().filter(|label| !label.is_empty())
    }

    /// SASL username presented alongside the token.
    pub fn sas_username(key_name: &str, registry: &str) -> String {
        format!("{key_name}@sas.root.{registry}")
    }
}
