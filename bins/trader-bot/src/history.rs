use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

/// Cap per chat; older ids fall off and simply survive a /reset.
const MAX_TRACKED_PER_CHAT: usize = 200;

/// Message ids seen or sent per chat, kept so /reset can sweep them.
#[derive(Debug, Default)]
pub struct MessageLog {
    inner: Mutex<HashMap<i64, VecDeque<i64>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, chat_id: i64, message_id: i64) {
        let mut chats = self.inner.lock().await;
        let tracked = chats.entry(chat_id).or_default();
        tracked.push_back(message_id);
        if tracked.len() > MAX_TRACKED_PER_CHAT {
            tracked.pop_front();
        }
    }

    /// Take every tracked id for the chat, oldest first.
    pub async fn drain(&self, chat_id: i64) -> Vec<i64> {
        self.inner
            .lock()
            .await
            .remove(&chat_id)
            .map(Vec::from)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_returns_ids_in_order_and_empties_the_chat() {
        let log = MessageLog::new();
        log.record(5, 10).await;
        log.record(5, 11).await;
        log.record(6, 99).await;

        assert_eq!(log.drain(5).await, vec![10, 11]);
        assert!(log.drain(5).await.is_empty());
        assert_eq!(log.drain(6).await, vec![99]);
    }

    #[tokio::test]
    async fn oldest_ids_fall_off_beyond_the_cap() {
        let log = MessageLog::new();
        for id in 0..(MAX_TRACKED_PER_CHAT as i64 + 3) {
            log.record(1, id).await;
        }

        let drained = log.drain(1).await;
        assert_eq!(drained.len(), MAX_TRACKED_PER_CHAT);
        assert_eq!(drained[0], 3);
    }
}
