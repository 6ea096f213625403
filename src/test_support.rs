//! Scripted [`AgentClient`] for deterministic pipeline tests
//!
//! Replies are queued per role and module. Every call is recorded so tests
//! can assert on the prompts the pipeline produced.

use crate::models::AgentRole;
use crate::orchestrator::{AgentClient, AgentSpec};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted call does
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Fail with this message
    Fail(String),
    /// Reply after a delay
    Delayed(Duration, String),
    /// Never resolve
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub spec: AgentSpec,
    pub prompt: String,
}

type Key = (AgentRole, Option<String>);

#[derive(Debug, Default)]
pub struct ScriptedAgent {
    replies: Mutex<HashMap<Key, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `role` (and `module`, for module calls)
    pub fn push(self, role: AgentRole, module: Option<&str>, reply: Reply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies
                .entry((role, module.map(str::to_string)))
                .or_default()
                .push_back(reply);
        }
        self
    }

    pub fn top_level(self, text: &str) -> Self {
        self.push(AgentRole::TopLevel, None, Reply::Text(text.to_string()))
    }

    pub fn module(self, name: &str, text: &str) -> Self {
        self.push(AgentRole::Module, Some(name), Reply::Text(text.to_string()))
    }

    pub fn repair(self, text: &str) -> Self {
        self.push(AgentRole::Repair, None, Reply::Text(text.to_string()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, role: AgentRole) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.spec.role == role)
            .collect()
    }

    fn next_reply(&self, spec: &AgentSpec) -> Option<Reply> {
        let mut replies = self.replies.lock().ok()?;
        replies
            .get_mut(&(spec.role, spec.module.clone()))
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn invoke(&self, spec: &AgentSpec, prompt: &str) -> anyhow::Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                spec: spec.clone(),
                prompt: prompt.to_string(),
            });
        }

        match self.next_reply(spec) {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!(message)),
            Some(Reply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(Reply::Hang) => futures::future::pending().await,
            None => anyhow::bail!(
                "no scripted reply for {} {}",
                spec.role.name(),
                spec.module.as_deref().unwrap_or("")
            ),
        }
    }
}
