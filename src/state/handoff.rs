/// Transient cross-session holder for the in-memory image sequence
///
/// When a grid session closes its records are stashed here under the
/// session name; the next session with the same name picks them up
/// instead of reloading from the store. Nothing here is durable.

use std::collections::HashMap;
use std::sync::Arc;

use super::data::ImageRecord;

#[derive(Debug, Default)]
pub struct HandoffHolder {
    entries: HashMap<String, Arc<[ImageRecord]>>,
}

impl HandoffHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `records` for the next session named `key`, replacing any previous entry
    pub fn stash(&mut self, key: &str, records: Vec<ImageRecord>) {
        self.entries.insert(key.to_string(), Arc::from(records));
    }

    /// Look at a stashed sequence without consuming it
    pub fn peek(&self, key: &str) -> Option<Arc<[ImageRecord]>> {
        self.entries.get(key).cloned()
    }

    /// Consume the stashed sequence for `key`
    pub fn take(&mut self, key: &str) -> Option<Arc<[ImageRecord]>> {
        self.entries.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record_from;

    #[test]
    fn test_take_is_one_shot() {
        let mut holder = HandoffHolder::new();
        holder.stash("grid", vec![record_from("a", 1, 1, [0, 0, 0])]);

        assert_eq!(holder.peek("grid").map(|r| r.len()), Some(1));
        assert_eq!(holder.take("grid").map(|r| r.len()), Some(1));
        assert!(holder.take("grid").is_none());
    }

    #[test]
    fn test_keys_are_independent() {
        let mut holder = HandoffHolder::new();
        holder.stash("grid", Vec::new());

        assert!(holder.take("other").is_none());
        assert!(holder.take("grid").is_some());
    }
}
