//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use mindspace::core::ChatGateway;
use mindspace::error::GatewayError;
use mindspace::types::Turn;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Gateway that replays canned results and records every history it saw
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    seen: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedGateway {
    pub fn new(replies: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn reply(&self, history: &[Turn]) -> Result<String, GatewayError> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport {
                message: "script exhausted".into(),
            }))
    }
}

/// Gateway that holds each call until the test releases it.
/// Calls are keyed by the text of the last turn and answer `answer to <text>`.
#[derive(Default)]
pub struct GatedGateway {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedGateway {
    fn gate(&self, key: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Let the call for `key` return; works before or after it starts waiting
    pub fn release(&self, key: &str) {
        self.gate(key).notify_one();
    }
}

#[async_trait]
impl ChatGateway for GatedGateway {
    async fn reply(&self, history: &[Turn]) -> Result<String, GatewayError> {
        let key = history.last().map(|t| t.text.clone()).unwrap_or_default();
        self.gate(&key).notified().await;
        Ok(format!("answer to {}", key))
    }
}
