//! `system.multicall` building and result handling
//!
//! aria2 batches calls through a regular method rather than a JSON-RPC batch
//! array. The single parameter is a list of `{methodName, params}` structs;
//! the result is a list where each element is either a one-element array
//! holding that call's value or a fault struct `{code, message}`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ariarpc_client::{Client, Multicall};
//! use serde_json::json;
//!
//! # async fn example(client: &Client) -> ariarpc_core::Result<()> {
//! let batch = Multicall::new()
//!     .add("aria2.tellActive", vec![])
//!     .add("aria2.getGlobalStat", vec![]);
//!
//! let results = client.multicall(batch).await?;
//! let active: Vec<serde_json::Value> = results.get(0)?;
//! let stat: serde_json::Value = results.get(1)?;
//! # Ok(())
//! # }
//! ```

use ariarpc_core::{methods, Error, JsonRpcErrorData, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Builder for a `system.multicall`
#[derive(Debug, Clone, Default)]
pub struct Multicall {
    calls: Vec<(String, Vec<Value>)>,
}

impl Multicall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call; its index in the result equals its position here
    pub fn add(mut self, method: impl Into<String>, params: Vec<Value>) -> Self {
        self.push(method, params);
        self
    }

    /// Append a call in place, returning its result index
    pub fn push(&mut self, method: impl Into<String>, params: Vec<Value>) -> usize {
        self.calls.push((method.into(), params));
        self.calls.len() - 1
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Parameter list for `system.multicall`, token injected per nested call
    pub(crate) fn into_params(self, secret: Option<&str>) -> Result<Vec<Value>> {
        if self.calls.is_empty() {
            return Err(Error::InvalidParams("multicall needs at least one call".into()));
        }

        let nested: Vec<Value> = self
            .calls
            .into_iter()
            .map(|(method, params)| {
                let params = methods::with_token(&method, params, secret);
                json!({"methodName": method, "params": params})
            })
            .collect();

        Ok(vec![Value::Array(nested)])
    }
}

/// Results of a `system.multicall`, in call order
#[derive(Debug, Clone)]
pub struct MulticallResponse {
    items: Vec<Value>,
}

impl MulticallResponse {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Typed result of the call at `index`
    ///
    /// A fault comes back as [`Error::JsonRpc`].
    pub fn get<R: DeserializeOwned>(&self, index: usize) -> Result<R> {
        let value = self.value(index).ok_or_else(|| {
            Error::InvalidParams(format!("no multicall result at index {}", index))
        })??;
        serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Untyped outcome of every call
    pub fn into_results(self) -> Vec<Result<Value>> {
        self.items.into_iter().map(unwrap_item).collect()
    }

    fn value(&self, index: usize) -> Option<Result<Value>> {
        self.items.get(index).cloned().map(unwrap_item)
    }
}

fn unwrap_item(item: Value) -> Result<Value> {
    match item {
        Value::Array(mut values) if values.len() == 1 => Ok(values.remove(0)),
        Value::Object(_) => match serde_json::from_value::<JsonRpcErrorData>(item) {
            Ok(fault) => Err(Error::JsonRpc(fault)),
            Err(e) => Err(Error::Decode(format!("multicall fault: {}", e))),
        },
        other => Err(Error::Decode(format!("unexpected multicall item: {}", other))),
    }
}
