use anyhow::Result;
use async_trait::async_trait;
use chatgraph_llm::Message;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persists the message log of a conversation thread between turns.
///
/// Only `messages` is stored. The windowed history is derived data and is
/// recomputed at the start of every turn.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Stored messages for `thread_id`, empty when the thread is unknown
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>>;

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<()>;

    async fn delete(&self, thread_id: &str) -> Result<()>;
}

/// In-process checkpointer; state is lost on restart
#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    threads: RwLock<HashMap<String, Vec<Message>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<()> {
        let mut threads = self.threads.write().await;
        threads.insert(thread_id.to_string(), messages.to_vec());
        Ok(())
    }

    async fn delete(&self, thread_id: &str) -> Result<()> {
        self.threads.write().await.remove(thread_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_delete() {
        let checkpointer = MemoryCheckpointer::new();
        assert!(checkpointer.load("t1").await.unwrap().is_empty());

        let messages = vec![Message::human("hi"), Message::ai("hello")];
        checkpointer.save("t1", &messages).await.unwrap();
        assert_eq!(checkpointer.load("t1").await.unwrap(), messages);
        assert!(checkpointer.load("t2").await.unwrap().is_empty());

        checkpointer.delete("t1").await.unwrap();
        assert!(checkpointer.load("t1").await.unwrap().is_empty());
        assert_eq!(checkpointer.thread_count().await, 0);
    }
}
