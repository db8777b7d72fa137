//! aria2 method and notification names
//!
//! Everything the daemon exposes lives in one of two namespaces: `aria2.*`
//! for download control and `system.*` for meta operations.

pub const ADD_URI: &str = "aria2.addUri";
pub const ADD_TORRENT: &str = "aria2.addTorrent";
pub const ADD_METALINK: &str = "aria2.addMetalink";
pub const REMOVE: &str = "aria2.remove";
pub const FORCE_REMOVE: &str = "aria2.forceRemove";
pub const PAUSE: &str = "aria2.pause";
pub const PAUSE_ALL: &str = "aria2.pauseAll";
pub const FORCE_PAUSE: &str = "aria2.forcePause";
pub const FORCE_PAUSE_ALL: &str = "aria2.forcePauseAll";
pub const UNPAUSE: &str = "aria2.unpause";
pub const UNPAUSE_ALL: &str = "aria2.unpauseAll";
pub const TELL_STATUS: &str = "aria2.tellStatus";
pub const GET_URIS: &str = "aria2.getUris";
pub const GET_FILES: &str = "aria2.getFiles";
pub const GET_PEERS: &str = "aria2.getPeers";
pub const GET_SERVERS: &str = "aria2.getServers";
pub const TELL_ACTIVE: &str = "aria2.tellActive";
pub const TELL_WAITING: &str = "aria2.tellWaiting";
pub const TELL_STOPPED: &str = "aria2.tellStopped";
pub const CHANGE_POSITION: &str = "aria2.changePosition";
pub const CHANGE_URI: &str = "aria2.changeUri";
pub const GET_OPTION: &str = "aria2.getOption";
pub const CHANGE_OPTION: &str = "aria2.changeOption";
pub const GET_GLOBAL_OPTION: &str = "aria2.getGlobalOption";
pub const CHANGE_GLOBAL_OPTION: &str = "aria2.changeGlobalOption";
pub const GET_GLOBAL_STAT: &str = "aria2.getGlobalStat";
pub const PURGE_DOWNLOAD_RESULT: &str = "aria2.purgeDownloadResult";
pub const REMOVE_DOWNLOAD_RESULT: &str = "aria2.removeDownloadResult";
pub const GET_VERSION: &str = "aria2.getVersion";
pub const GET_SESSION_INFO: &str = "aria2.getSessionInfo";
pub const SHUTDOWN: &str = "aria2.shutdown";
pub const FORCE_SHUTDOWN: &str = "aria2.forceShutdown";
pub const SAVE_SESSION: &str = "aria2.saveSession";

pub const MULTICALL: &str = "system.multicall";
pub const LIST_METHODS: &str = "system.listMethods";
pub const LIST_NOTIFICATIONS: &str = "system.listNotifications";

pub const ON_DOWNLOAD_START: &str = "aria2.onDownloadStart";
pub const ON_DOWNLOAD_PAUSE: &str = "aria2.onDownloadPause";
pub const ON_DOWNLOAD_STOP: &str = "aria2.onDownloadStop";
pub const ON_DOWNLOAD_COMPLETE: &str = "aria2.onDownloadComplete";
pub const ON_DOWNLOAD_ERROR: &str = "aria2.onDownloadError";
pub const ON_BT_DOWNLOAD_COMPLETE: &str = "aria2.onBtDownloadComplete";

/// Prefix of the secret token parameter
pub const TOKEN_PREFIX: &str = "token:";

/// Whether the daemon expects the secret token on this method
///
/// The introspection calls are answered without authentication. A multicall
/// carries the token inside each nested call instead.
pub fn requires_token(method: &str) -> bool {
    !matches!(method, LIST_METHODS | LIST_NOTIFICATIONS | MULTICALL)
}

/// Append `token:<secret>` as the last parameter when a secret is configured
pub fn with_token(
    method: &str,
    mut params: Vec<serde_json::Value>,
    secret: Option<&str>,
) -> Vec<serde_json::Value> {
    if let Some(secret) = secret {
        if requires_token(method) {
            params.push(serde_json::Value::String(format!("{}{}", TOKEN_PREFIX, secret)));
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_appended_last() {
        let params = with_token(TELL_STATUS, vec![json!("gid")], Some("s3cret"));
        assert_eq!(params, vec![json!("gid"), json!("token:s3cret")]);
    }

    #[test]
    fn test_list_methods_exempt() {
        let params = with_token(LIST_METHODS, vec![], Some("s3cret"));
        assert!(params.is_empty());
        assert!(!requires_token(LIST_NOTIFICATIONS));
        assert!(!requires_token(MULTICALL));
        assert!(requires_token(ADD_URI));
    }

    #[test]
    fn test_no_secret_leaves_params() {
        let params = with_token(PAUSE_ALL, vec![], None);
        assert!(params.is_empty());
    }
}
