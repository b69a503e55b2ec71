use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String
}

/// Conversation and page context of one browser session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSession {
    pub history: Vec<Message>,
    pub current_url: Option<String>,
    pub dom_summary: Option<String>,
    pub scratchpad: BTreeMap<String, serde_json::Value>
}

impl AgentSession {
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.history.push(Message {
            role: role.into(),
            content: content.into()
        });
    }

    pub fn update_context(&mut self, url: impl Into<String>, dom_summary: impl Into<String>) {
        self.current_url = Some(url.into());
        self.dom_summary = Some(dom_summary.into());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Concurrent per-session state, created by the host and passed in.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, AgentSession>
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable handle to a session, created empty on first use.
    ///
    /// The handle locks the session's shard; drop it before awaiting.
    pub fn get_session(&self, session_id: &str) -> RefMut<'_, String, AgentSession> {
        self.sessions.entry(session_id.to_string()).or_default()
    }

    /// Copy of a session without creating it.
    pub fn snapshot(&self, session_id: &str) -> Option<AgentSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_session_created_on_demand() {
        let store = SessionStore::new();
        assert!(store.snapshot("tab-1").is_none());

        store.get_session("tab-1").add_message("user", "What is this page?");
        store
            .get_session("tab-1")
            .update_context("https://a.test", "A page");

        let session = store.snapshot("tab-1").unwrap();
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.current_url.as_deref(), Some("https://a.test"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_and_remove() {
        let store = SessionStore::new();
        {
            let mut session = store.get_session("tab-1");
            session.add_message("user", "hi");
            session
                .scratchpad
                .insert("step".to_string(), serde_json::json!(2));
            session.clear();
            assert_eq!(*session, AgentSession::default());
        }

        assert!(store.clear_session("tab-1"));
        assert!(!store.clear_session("tab-1"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sessions() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    store
                        .get_session(&format!("tab-{}", i % 2))
                        .add_message("user", format!("{i}-{j}"));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let total: usize = ["tab-0", "tab-1"]
            .iter()
            .map(|id| store.snapshot(id).unwrap().history.len())
            .sum();
        assert_eq!(total, 80);
    }
}
