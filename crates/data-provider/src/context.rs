// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-request context threaded through every provider call
//!
//! The context is created by whatever transport receives the request. Routing
//! layers forward it by reference and never read it; only the backend that
//! finally serves a call may look inside.

use std::{collections::HashMap, net::IpAddr};

use serde_json::Value;
use uuid::Uuid;

/// Request-scoped identity and capability token
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    request_id: String,
    remote_ip: Option<IpAddr>,
    x_forwarded_for: Option<String>,
    client_feature_flags: HashMap<String, Value>,
}

impl RequestContext {
    /// Create a context with a fresh request id
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4().to_string())
    }

    /// Create a context carrying an externally assigned request id
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            remote_ip: None,
            x_forwarded_for: None,
            client_feature_flags: HashMap::new(),
        }
    }

    /// Record the address of the remote peer
    #[must_use]
    pub fn with_remote_ip(mut self, remote_ip: IpAddr) -> Self {
        self.remote_ip = Some(remote_ip);
        self
    }

    /// Record the raw `X-Forwarded-For` header
    #[must_use]
    pub fn with_x_forwarded_for(mut self, header: impl Into<String>) -> Self {
        self.x_forwarded_for = Some(header.into());
        self
    }

    /// Set a client feature flag
    #[must_use]
    pub fn with_feature_flag(mut self, name: impl Into<String>, value: Value) -> Self {
        self.client_feature_flags.insert(name.into(), value);
        self
    }

    /// Request id used to correlate logs
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Address of the remote peer, if known
    pub fn remote_ip(&self) -> Option<IpAddr> {
        self.remote_ip
    }

    /// Raw `X-Forwarded-For` header, if present
    pub fn x_forwarded_for(&self) -> Option<&str> {
        self.x_forwarded_for.as_deref()
    }

    /// Feature flags supplied by the client
    pub fn client_feature_flags(&self) -> &HashMap<String, Value> {
        &self.client_feature_flags
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
