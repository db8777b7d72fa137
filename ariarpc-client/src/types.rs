//! Result shapes returned by aria2
//!
//! aria2 encodes nearly every number as a decimal string, so these structs
//! keep them as `String`. Structs used with key filters (`tellStatus`,
//! `tellActive`, ...) default every field so partial objects decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Download options, e.g. `{"dir": "/tmp", "split": "4"}`
pub type Options = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub enabled_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalStat {
    pub download_speed: String,
    pub upload_speed: String,
    pub num_active: String,
    pub num_waiting: String,
    pub num_stopped: String,
    pub num_stopped_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UriInfo {
    pub uri: String,
    /// `used` or `waiting`
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    pub index: String,
    pub path: String,
    pub length: String,
    pub completed_length: String,
    pub selected: String,
    pub uris: Vec<UriInfo>,
}

/// One BitTorrent peer from `aria2.getPeers`
///
/// Flags arrive as the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerInfo {
    /// Percent-encoded peer id
    pub peer_id: String,
    pub ip: String,
    pub port: String,
    /// Hex bitfield of the pieces the peer has
    pub bitfield: String,
    pub am_choking: String,
    pub peer_choking: String,
    pub download_speed: String,
    pub upload_speed: String,
    pub seeder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConnection {
    /// URI as originally added
    pub uri: String,
    /// URI in use, after redirects
    pub current_uri: String,
    pub download_speed: String,
}

/// Servers connected for one file, from `aria2.getServers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInfo {
    /// 1-based file index
    pub index: String,
    pub servers: Vec<ServerConnection>,
}

/// Status of one download
///
/// Keys not modelled here (BitTorrent info, verification state, ...) land
/// in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusInfo {
    pub gid: String,
    /// `active`, `waiting`, `paused`, `error`, `complete` or `removed`
    pub status: String,
    pub total_length: String,
    pub completed_length: String,
    pub upload_length: String,
    pub download_speed: String,
    pub upload_speed: String,
    pub connections: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub dir: String,
    pub files: Vec<FileInfo>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Anchor for `aria2.changePosition`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionHow {
    #[serde(rename = "POS_SET")]
    Set,
    #[serde(rename = "POS_CUR")]
    Current,
    #[serde(rename = "POS_END")]
    End,
}
