//! Test transport that records requests instead of sending them

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{Error, Result};

use super::transport::Transport;

enum Behavior {
    Respond(StatusCode),
    Fail,
    Hang,
}

pub(crate) struct RecordingTransport {
    behavior: Behavior,
    requests: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn responding(status: StatusCode) -> Arc<Self> {
        Self::with(Behavior::Respond(status))
    }

    /// Fails like an unreachable host
    pub(crate) fn failing() -> Arc<Self> {
        Self::with(Behavior::Fail)
    }

    /// Never answers
    pub(crate) fn hanging() -> Arc<Self> {
        Self::with(Behavior::Hang)
    }

    /// (endpoint, body) of every POST attempt
    pub(crate) fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(&self, endpoint: &str, body: String) -> Result<StatusCode> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body));

        match self.behavior {
            Behavior::Respond(status) => Ok(status),
            Behavior::Fail => Err(Error::Forward(
                "HTTP request failed: connection refused".to_string(),
            )),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
