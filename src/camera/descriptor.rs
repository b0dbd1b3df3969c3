//! Camera descriptors
//!
//! Read-only snapshots of the camera fleet as supplied by the inventory.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Unique identifier for a camera
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    /// Create a new camera id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CameraId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Snapshot of one camera as known to the inventory
///
/// Field aliases accept the camelCase documents produced by the console
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    pub id: CameraId,

    #[serde(alias = "displayName", alias = "name")]
    pub display_name: String,

    #[serde(alias = "locationName", alias = "location", default)]
    pub location_name: String,

    #[serde(alias = "ipAddress", alias = "ip", default)]
    pub ip_address: String,

    #[serde(alias = "onlineFlag", alias = "isOnline", default)]
    pub online: bool,

    /// Playable stream URL; blank strings in documents are treated as absent
    #[serde(
        alias = "streamEndpoint",
        alias = "streamUrl",
        default,
        deserialize_with = "blank_url_as_none"
    )]
    pub stream_endpoint: Option<Url>,
}

impl CameraDescriptor {
    /// Create an offline descriptor without endpoint
    pub fn new(id: impl Into<CameraId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            location_name: String::new(),
            ip_address: String::new(),
            online: false,
            stream_endpoint: None,
        }
    }

    /// Set the location name
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location_name = location.into();
        self
    }

    /// Set the IP address
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = ip.into();
        self
    }

    /// Set the online flag
    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Set the stream endpoint
    pub fn endpoint(mut self, url: Url) -> Self {
        self.stream_endpoint = Some(url);
        self
    }

    /// Whether a playable endpoint is present
    pub fn has_endpoint(&self) -> bool {
        self.stream_endpoint.is_some()
    }
}

fn blank_url_as_none<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Url::parse(s).map(Some).map_err(serde::de::Error::custom),
    }
}
