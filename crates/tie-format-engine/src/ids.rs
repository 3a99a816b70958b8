//! Identifier supply for new collections and sub-match-ups.

use std::collections::VecDeque;

use uuid::Uuid;

/// Hands out pool identifiers first, then random UUIDs.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    pool: VecDeque<String>,
}

impl IdGenerator {
    pub fn new(pool: impl IntoIterator<Item = String>) -> Self {
        Self {
            pool: pool.into_iter().collect(),
        }
    }

    pub fn next_id(&mut self) -> String {
        self.pool
            .pop_front()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Identifiers left in the pool.
    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    /// Roll back to a checkpoint taken with `clone`.
    pub fn restore(&mut self, checkpoint: IdGenerator) {
        *self = checkpoint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_first_then_uuid() {
        let mut ids = IdGenerator::new(["a".to_string(), "b".to_string()]);
        assert_eq!(ids.next_id(), "a");
        assert_eq!(ids.next_id(), "b");
        let generated = ids.next_id();
        assert!(Uuid::parse_str(&generated).is_ok());
        assert_ne!(generated, ids.next_id());
    }

    #[test]
    fn restore_checkpoint() {
        let mut ids = IdGenerator::new(["a".to_string()]);
        let checkpoint = ids.clone();
        ids.next_id();
        assert_eq!(ids.remaining(), 0);
        ids.restore(checkpoint);
        assert_eq!(ids.next_id(), "a");
    }
}
