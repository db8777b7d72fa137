//! aria2 client facade
//!
//! [`Client`] wraps any [`Caller`] and adds what every aria2 call needs: the
//! secret token as the last parameter and typed decoding of the result. The
//! method wrappers below only marshal arguments into positional parameter
//! lists; all the interesting work happens in the transport.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ariarpc_client::ClientBuilder;
//!
//! # async fn example() -> ariarpc_core::Result<()> {
//! let client = ClientBuilder::new("ws://localhost:6800/jsonrpc")
//!     .secret("s3cret")
//!     .build()
//!     .await?;
//!
//! let version = client.get_version().await?;
//! println!("aria2 {}", version.version);
//!
//! let gid = client.add_uri(&["https://example.org/file.iso"], None, None).await?;
//! client.pause(&gid).await?;
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use crate::caller::{Caller, CallerExt};
use crate::multicall::{Multicall, MulticallResponse};
use crate::types::{
    FileInfo, GlobalStat, Options, PeerInfo, PositionHow, ServerInfo, SessionInfo, StatusInfo,
    UriInfo, VersionInfo,
};
use ariarpc_core::{methods, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

/// Transport-agnostic aria2 client
#[derive(Clone)]
pub struct Client {
    caller: Arc<dyn Caller>,
    secret: Option<String>,
}

impl Client {
    pub fn new(caller: Arc<dyn Caller>, secret: Option<String>) -> Self {
        Self { caller, secret }
    }

    /// Underlying transport
    pub fn caller(&self) -> &Arc<dyn Caller> {
        &self.caller
    }

    /// Call any method, appending the token where required
    pub async fn call<R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R> {
        let params = methods::with_token(method, params, self.secret.as_deref());
        self.caller.call(method, params).await
    }

    /// Close the transport
    pub async fn close(&self) -> Result<()> {
        self.caller.close().await
    }

    /// `aria2.addUri`; returns the new GID
    pub async fn add_uri<S: AsRef<str>>(
        &self,
        uris: &[S],
        options: Option<&Options>,
        position: Option<u32>,
    ) -> Result<String> {
        let uris: Vec<&str> = uris.iter().map(AsRef::as_ref).collect();
        let params = with_options(vec![json!(uris)], options, position);
        self.call(methods::ADD_URI, params).await
    }

    /// `aria2.addTorrent` with the raw .torrent contents
    pub async fn add_torrent<S: AsRef<str>>(
        &self,
        torrent: &[u8],
        web_seeds: &[S],
        options: Option<&Options>,
        position: Option<u32>,
    ) -> Result<String> {
        let seeds: Vec<&str> = web_seeds.iter().map(AsRef::as_ref).collect();
        let params = with_options(
            vec![json!(STANDARD.encode(torrent)), json!(seeds)],
            options,
            position,
        );
        self.call(methods::ADD_TORRENT, params).await
    }

    /// `aria2.addMetalink` with the raw .metalink contents; returns one GID per file
    pub async fn add_metalink(
        &self,
        metalink: &[u8],
        options: Option<&Options>,
        position: Option<u32>,
    ) -> Result<Vec<String>> {
        let params = with_options(vec![json!(STANDARD.encode(metalink))], options, position);
        self.call(methods::ADD_METALINK, params).await
    }

    pub async fn remove(&self, gid: &str) -> Result<String> {
        self.call(methods::REMOVE, vec![json!(gid)]).await
    }

    pub async fn force_remove(&self, gid: &str) -> Result<String> {
        self.call(methods::FORCE_REMOVE, vec![json!(gid)]).await
    }

    pub async fn pause(&self, gid: &str) -> Result<String> {
        self.call(methods::PAUSE, vec![json!(gid)]).await
    }

    pub async fn pause_all(&self) -> Result<String> {
        self.call(methods::PAUSE_ALL, vec![]).await
    }

    pub async fn force_pause(&self, gid: &str) -> Result<String> {
        self.call(methods::FORCE_PAUSE, vec![json!(gid)]).await
    }

    pub async fn force_pause_all(&self) -> Result<String> {
        self.call(methods::FORCE_PAUSE_ALL, vec![]).await
    }

    pub async fn unpause(&self, gid: &str) -> Result<String> {
        self.call(methods::UNPAUSE, vec![json!(gid)]).await
    }

    pub async fn unpause_all(&self) -> Result<String> {
        self.call(methods::UNPAUSE_ALL, vec![]).await
    }

    /// `aria2.tellStatus`; an empty `keys` returns every key
    pub async fn tell_status(&self, gid: &str, keys: &[&str]) -> Result<StatusInfo> {
        self.call(methods::TELL_STATUS, with_keys(vec![json!(gid)], keys))
            .await
    }

    pub async fn get_uris(&self, gid: &str) -> Result<Vec<UriInfo>> {
        self.call(methods::GET_URIS, vec![json!(gid)]).await
    }

    pub async fn get_files(&self, gid: &str) -> Result<Vec<FileInfo>> {
        self.call(methods::GET_FILES, vec![json!(gid)]).await
    }

    /// BitTorrent peers of a download
    pub async fn get_peers(&self, gid: &str) -> Result<Vec<PeerInfo>> {
        self.call(methods::GET_PEERS, vec![json!(gid)]).await
    }

    /// HTTP/FTP servers in use, per file
    pub async fn get_servers(&self, gid: &str) -> Result<Vec<ServerInfo>> {
        self.call(methods::GET_SERVERS, vec![json!(gid)]).await
    }

    pub async fn tell_active(&self, keys: &[&str]) -> Result<Vec<StatusInfo>> {
        self.call(methods::TELL_ACTIVE, with_keys(vec![], keys)).await
    }

    /// `aria2.tellWaiting`; a negative offset counts from the end
    pub async fn tell_waiting(
        &self,
        offset: i64,
        num: u32,
        keys: &[&str],
    ) -> Result<Vec<StatusInfo>> {
        self.call(
            methods::TELL_WAITING,
            with_keys(vec![json!(offset), json!(num)], keys),
        )
        .await
    }

    pub async fn tell_stopped(
        &self,
        offset: i64,
        num: u32,
        keys: &[&str],
    ) -> Result<Vec<StatusInfo>> {
        self.call(
            methods::TELL_STOPPED,
            with_keys(vec![json!(offset), json!(num)], keys),
        )
        .await
    }

    /// Move a download in the queue; returns its new position
    pub async fn change_position(&self, gid: &str, pos: i64, how: PositionHow) -> Result<i64> {
        self.call(
            methods::CHANGE_POSITION,
            vec![json!(gid), json!(pos), json!(how)],
        )
        .await
    }

    /// Remove `del` and add `add` URIs of one file; returns (removed, added)
    pub async fn change_uri<S: AsRef<str>>(
        &self,
        gid: &str,
        file_index: u32,
        del: &[S],
        add: &[S],
        position: Option<u32>,
    ) -> Result<(u64, u64)> {
        let del: Vec<&str> = del.iter().map(AsRef::as_ref).collect();
        let add: Vec<&str> = add.iter().map(AsRef::as_ref).collect();
        let mut params = vec![json!(gid), json!(file_index), json!(del), json!(add)];
        if let Some(position) = position {
            params.push(json!(position));
        }
        self.call(methods::CHANGE_URI, params).await
    }

    pub async fn get_option(&self, gid: &str) -> Result<Options> {
        self.call(methods::GET_OPTION, vec![json!(gid)]).await
    }

    pub async fn change_option(&self, gid: &str, options: &Options) -> Result<String> {
        self.call(methods::CHANGE_OPTION, vec![json!(gid), json!(options)])
            .await
    }

    pub async fn get_global_option(&self) -> Result<Options> {
        self.call(methods::GET_GLOBAL_OPTION, vec![]).await
    }

    pub async fn change_global_option(&self, options: &Options) -> Result<String> {
        self.call(methods::CHANGE_GLOBAL_OPTION, vec![json!(options)])
            .await
    }

    pub async fn get_global_stat(&self) -> Result<GlobalStat> {
        self.call(methods::GET_GLOBAL_STAT, vec![]).await
    }

    pub async fn purge_download_result(&self) -> Result<String> {
        self.call(methods::PURGE_DOWNLOAD_RESULT, vec![]).await
    }

    pub async fn remove_download_result(&self, gid: &str) -> Result<String> {
        self.call(methods::REMOVE_DOWNLOAD_RESULT, vec![json!(gid)])
            .await
    }

    pub async fn get_version(&self) -> Result<VersionInfo> {
        self.call(methods::GET_VERSION, vec![]).await
    }

    pub async fn get_session_info(&self) -> Result<SessionInfo> {
        self.call(methods::GET_SESSION_INFO, vec![]).await
    }

    pub async fn shutdown(&self) -> Result<String> {
        self.call(methods::SHUTDOWN, vec![]).await
    }

    pub async fn force_shutdown(&self) -> Result<String> {
        self.call(methods::FORCE_SHUTDOWN, vec![]).await
    }

    pub async fn save_session(&self) -> Result<String> {
        self.call(methods::SAVE_SESSION, vec![]).await
    }

    /// Run several calls in one round trip
    ///
    /// An empty batch fails before anything is sent.
    pub async fn multicall(&self, batch: Multicall) -> Result<MulticallResponse> {
        let params = batch.into_params(self.secret.as_deref())?;
        let items: Vec<Value> = self.call(methods::MULTICALL, params).await?;
        Ok(MulticallResponse::new(items))
    }

    pub async fn list_methods(&self) -> Result<Vec<String>> {
        self.call(methods::LIST_METHODS, vec![]).await
    }

    pub async fn list_notifications(&self) -> Result<Vec<String>> {
        self.call(methods::LIST_NOTIFICATIONS, vec![]).await
    }
}

/// Append options and position; options must be present when position is
fn with_options(
    mut params: Vec<Value>,
    options: Option<&Options>,
    position: Option<u32>,
) -> Vec<Value> {
    match (options, position) {
        (None, None) => {}
        (Some(options), None) => params.push(json!(options)),
        (options, Some(position)) => {
            params.push(options.map(|o| json!(o)).unwrap_or_else(|| json!({})));
            params.push(json!(position));
        }
    }
    params
}

fn with_keys(mut params: Vec<Value>, keys: &[&str]) -> Vec<Value> {
    if !keys.is_empty() {
        params.push(json!(keys));
    }
    params
}
