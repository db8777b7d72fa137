//! Transport-agnostic call contract

use ariarpc_core::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Something that can carry a JSON-RPC call to aria2 and back
///
/// Implemented by [`crate::HttpCaller`] and [`crate::SocketCaller`]. `params`
/// is passed through verbatim; the secret token, if any, must already be the
/// last element.
#[async_trait]
pub trait Caller: Send + Sync {
    /// Send one call and wait for its outcome
    ///
    /// A reply carrying an error object comes back as [`Error::JsonRpc`].
    async fn invoke(&self, method: &str, params: Vec<Value>) -> Result<Value>;

    /// Release the transport
    ///
    /// Idempotent. Calls made afterwards fail.
    async fn close(&self) -> Result<()>;

    /// Human-readable transport name, for logs
    fn transport(&self) -> &'static str;
}

/// Typed convenience on top of [`Caller::invoke`]
#[async_trait]
pub trait CallerExt: Caller {
    /// Invoke and decode the result into `R`
    async fn call<R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<R> {
        let value = self.invoke(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Decode(format!("{} result: {}", method, e)))
    }
}

impl<T: Caller + ?Sized> CallerExt for T {}
