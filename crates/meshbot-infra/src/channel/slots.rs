//! Node-style channel table.
//!
//! A node exposes a fixed number of channel slots. Slot 0 is always the
//! primary channel; the others are free until a name claims them.

use meshbot_core::channel::ChannelDirectory;
use meshbot_types::channel::{ChannelId, ChannelRef, MAX_CHANNELS, PRIMARY_CHANNEL_NAME};
use meshbot_types::error::ChannelError;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug)]
pub struct SlotChannelDirectory {
    slots: RwLock<Vec<Option<String>>>,
}

impl SlotChannelDirectory {
    pub fn new() -> Self {
        Self::with_primary(PRIMARY_CHANNEL_NAME)
    }

    /// Table whose primary slot carries a node-reported name.
    pub fn with_primary(name: impl Into<String>) -> Self {
        let mut slots = vec![None; MAX_CHANNELS as usize];
        slots[0] = Some(name.into());
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Number of occupied slots, primary included.
    pub async fn occupied(&self) -> usize {
        self.slots.read().await.iter().flatten().count()
    }
}

impl Default for SlotChannelDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_ref(index: usize, name: &str) -> ChannelRef {
    ChannelRef::new(ChannelId(index as u32), name)
}

impl ChannelDirectory for SlotChannelDirectory {
    async fn create_or_get(&self, name: &str) -> Result<ChannelRef, ChannelError> {
        let mut slots = self.slots.write().await;

        if let Some(index) = slots.iter().position(|slot| slot.as_deref() == Some(name)) {
            return Ok(slot_ref(index, name));
        }

        let index = slots
            .iter()
            .position(Option::is_none)
            .ok_or(ChannelError::NoFreeSlot { max: MAX_CHANNELS })?;
        slots[index] = Some(name.to_string());
        info!(channel = name, slot = index, "channel slot allocated");
        Ok(slot_ref(index, name))
    }

    async fn list(&self) -> Result<Vec<ChannelRef>, ChannelError> {
        let slots = self.slots.read().await;
        Ok(slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|name| slot_ref(index, name)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_with_primary_only() {
        let directory = SlotChannelDirectory::new();
        assert_eq!(directory.list().await.unwrap(), vec![ChannelRef::primary()]);
        assert_eq!(directory.occupied().await, 1);
    }

    #[tokio::test]
    async fn allocates_lowest_free_slot() {
        let directory = SlotChannelDirectory::new();

        let test = directory.create_or_get("test").await.unwrap();
        let ops = directory.create_or_get("ops").await.unwrap();

        assert_eq!(test, ChannelRef::new(1, "test"));
        assert_eq!(ops, ChannelRef::new(2, "ops"));
    }

    #[tokio::test]
    async fn existing_name_returns_same_slot() {
        let directory = SlotChannelDirectory::new();
        let first = directory.create_or_get("test").await.unwrap();
        let again = directory.create_or_get("test").await.unwrap();

        assert_eq!(first, again);
        assert_eq!(
            directory.create_or_get(PRIMARY_CHANNEL_NAME).await.unwrap().id,
            ChannelId::PRIMARY
        );
        assert_eq!(directory.occupied().await, 2);
    }

    #[tokio::test]
    async fn names_are_case_sensitive() {
        let directory = SlotChannelDirectory::new();
        let lower = directory.create_or_get("test").await.unwrap();
        let upper = directory.create_or_get("Test").await.unwrap();
        assert_ne!(lower.id, upper.id);
    }

    #[tokio::test]
    async fn full_table_rejects_new_names() {
        let directory = SlotChannelDirectory::new();
        for i in 1..MAX_CHANNELS {
            directory.create_or_get(&format!("ch{i}")).await.unwrap();
        }

        assert!(matches!(
            directory.create_or_get("one-too-many").await,
            Err(ChannelError::NoFreeSlot { max: MAX_CHANNELS })
        ));
        // Existing names still resolve.
        assert_eq!(
            directory.create_or_get("ch7").await.unwrap().id,
            ChannelId(7)
        );
    }

    #[tokio::test]
    async fn custom_primary_name() {
        let directory = SlotChannelDirectory::with_primary("LongFast");
        assert_eq!(
            directory.list().await.unwrap(),
            vec![ChannelRef::new(0, "LongFast")]
        );
    }
}
