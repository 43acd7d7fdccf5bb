//! Short-term window - recent-message buffer
//!
//! Holds the raw tail of the conversation. A bounded window truncates
//! FIFO on every push; an unbounded one relies on the consolidation
//! engine to drain its overflow.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Message, MemoryUpdater};

pub struct ShortTermWindow {
    buffer: RwLock<VecDeque<Message>>,
    capacity: Option<usize>,
}

impl ShortTermWindow {
    /// Window that keeps exactly the last `capacity` messages.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::new()),
            capacity: Some(capacity),
        }
    }

    /// Window trimmed externally via `drain_overflow`.
    pub fn unbounded() -> Self {
        Self {
            buffer: RwLock::new(VecDeque::new()),
            capacity: None,
        }
    }

    pub async fn push(&self, message: Message) {
        let mut buffer = self.buffer.write().await;
        buffer.push_back(message);
        if let Some(capacity) = self.capacity {
            while buffer.len() > capacity {
                buffer.pop_front();
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.buffer.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buffer.read().await.is_empty()
    }

    /// Full buffer contents in insertion order.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.buffer.read().await.iter().cloned().collect()
    }

    /// Last `n` messages in insertion order.
    pub async fn tail(&self, n: usize) -> Vec<Message> {
        let buffer = self.buffer.read().await;
        let skip = buffer.len().saturating_sub(n);
        buffer.iter().skip(skip).cloned().collect()
    }

    /// Remove and return everything except the last `keep` messages.
    pub async fn drain_overflow(&self, keep: usize) -> Vec<Message> {
        let mut buffer = self.buffer.write().await;
        if buffer.len() <= keep {
            return Vec::new();
        }
        let excess = buffer.len() - keep;
        buffer.drain(..excess).collect()
    }

    pub async fn clear(&self) {
        self.buffer.write().await.clear();
    }
}

#[async_trait]
impl MemoryUpdater for ShortTermWindow {
    async fn observe(&self, message: &Message) {
        self.push(message.clone()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_window_keeps_last_n_in_order() {
        let window = ShortTermWindow::bounded(3);
        for i in 0..5 {
            window.push(Message::user(format!("Message {}", i))).await;
        }

        let messages = window.snapshot().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "Message 2");
        assert_eq!(messages[2].content, "Message 4");
    }

    #[tokio::test]
    async fn drain_overflow_returns_oldest_prefix() {
        let window = ShortTermWindow::unbounded();
        for i in 0..5 {
            window.push(Message::user(format!("Message {}", i))).await;
        }

        let drained = window.drain_overflow(2).await;
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].content, "Message 0");
        assert_eq!(window.len().await, 2);
        assert_eq!(window.snapshot().await[0].content, "Message 3");
    }

    #[tokio::test]
    async fn drain_overflow_is_a_noop_below_the_mark() {
        let window = ShortTermWindow::unbounded();
        window.push(Message::user("only one")).await;
        assert!(window.drain_overflow(2).await.is_empty());
        assert_eq!(window.len().await, 1);
    }

    #[tokio::test]
    async fn tail_returns_the_most_recent_slice() {
        let window = ShortTermWindow::unbounded();
        for i in 0..4 {
            window.push(Message::user(format!("Message {}", i))).await;
        }

        let tail = window.tail(2).await;
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "Message 2");
        assert_eq!(tail[1].content, "Message 3");
    }
}
