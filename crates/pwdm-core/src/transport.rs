//! Request-layer boundary.
//!
//! `Transport` moves JSON to and from the server; the HTTP implementation
//! lives with the application. `ApiClient` layers the server's response
//! envelope on top and ends the session when the server reports it expired.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::TransportError;
use crate::session::Session;
use crate::types::ApiResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw JSON exchange with the server.
///
/// For `GET` the body is sent as query parameters, otherwise as the request
/// body. Implementations return `TransportError::Unauthorized` for the
/// session-expired status and the decoded JSON body for everything else the
/// server answers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        (**self).send(method, path, body).await
    }
}

pub struct ApiClient<T: Transport> {
    transport: T,
    session: Arc<Session>,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send a request and unwrap the `{ code, msg, data }` envelope.
    ///
    /// A non-success code becomes `TransportError::Api`. An unauthorized
    /// response ends the session before the error is returned.
    pub async fn request<R, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<R>, TransportError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| TransportError::Decode(format!("request body: {e}")))?;

        debug!(%method, path, "api request");
        let raw = match self.transport.send(method, path, body).await {
            Ok(raw) => raw,
            Err(TransportError::Unauthorized) => {
                warn!(%method, path, "server rejected the session; ending it");
                self.session.end();
                return Err(TransportError::Unauthorized);
            }
            Err(e) => return Err(e),
        };

        let response: ApiResponse<R> =
            serde_json::from_value(raw).map_err(|e| TransportError::Decode(e.to_string()))?;
        if !response.is_success() {
            debug!(code = response.code, msg = %response.msg, "api call failed");
            return Err(TransportError::Api {
                code: response.code,
                msg: response.msg,
            });
        }
        Ok(response.data)
    }

    /// Like [`request`](Self::request) but the payload must be present.
    pub async fn request_data<R, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, TransportError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(method, path, body)
            .await?
            .ok_or_else(|| TransportError::Decode(format!("{method} {path}: response has no data")))
    }
}
