use chrono::{DateTime, Utc};
use docchat_client::{ChatBackend, Message};
use futures::future::join_all;

use crate::error::Result;

/// Title shown for a thread without any user message
pub const NEW_THREAD_TITLE: &str = "New Chat";

const TITLE_MAX_CHARS: usize = 50;

/// Sidebar entry for one persisted thread; holds no message bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

impl ThreadSummary {
    pub fn from_messages(id: impl Into<String>, messages: &[Message]) -> Self {
        Self {
            id: id.into(),
            title: derive_title(messages),
            message_count: messages.len(),
            last_activity: messages.last().and_then(|m| m.timestamp),
        }
    }
}

/// First user message, cut to 50 characters with "..." appended when longer
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user()) else {
        return NEW_THREAD_TITLE.to_string();
    };

    let mut chars = first.content.chars();
    let mut title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        title.push_str("...");
    }
    title
}

/// Known threads, most recently active first
#[derive(Debug, Default)]
pub struct ThreadDirectory {
    threads: Vec<ThreadSummary>,
}

impl ThreadDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the list from the backend
    ///
    /// All detail fetches run concurrently and the list is swapped in only once
    /// every one of them has settled. Threads whose detail fetch fails are left
    /// out. If the id list itself cannot be fetched the current list is kept and
    /// the error returned.
    pub async fn refresh(&mut self, backend: &dyn ChatBackend) -> Result<()> {
        let ids = backend.list_sessions().await?;

        let fetches = ids.into_iter().map(|id| async move {
            match backend.get_session(&id).await {
                Ok(messages) => Some(ThreadSummary::from_messages(id, &messages)),
                Err(e) => {
                    tracing::warn!("Failed to load session {}: {}", id, e);
                    None
                }
            }
        });
        let summaries: Vec<ThreadSummary> = join_all(fetches).await.into_iter().flatten().collect();

        self.replace(summaries);
        tracing::debug!("Thread directory refreshed: {} threads", self.threads.len());
        Ok(())
    }

    /// Install a new list, ordering it by recency
    pub fn replace(&mut self, mut threads: Vec<ThreadSummary>) {
        sort_by_recency(&mut threads);
        self.threads = threads;
    }

    /// Local removal; no refetch
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.threads.len();
        self.threads.retain(|t| t.id != id);
        self.threads.len() != before
    }

    pub fn threads(&self) -> &[ThreadSummary] {
        &self.threads
    }

    pub fn get(&self, id: &str) -> Option<&ThreadSummary> {
        self.threads.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

/// Newest first; threads without activity go last, ties keep backend order
fn sort_by_recency(threads: &mut [ThreadSummary]) {
    threads.sort_by(|a, b| match (a.last_activity, b.last_activity) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
