//! Registry of bot classes (name -> factory).

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use meshbot_types::error::{BotError, SupervisorError};
use tracing::info;

use crate::bot::{BotBehavior, BotBehaviorDyn, BotDeps};

/// Builds a bot behavior for a new bot instance.
pub type BotFactory =
    Arc<dyn Fn(BotDeps) -> Result<Arc<dyn BotBehaviorDyn>, BotError> + Send + Sync>;

/// Bot classes available to `create_bot`, keyed by class name.
#[derive(Default)]
pub struct BotClassRegistry {
    classes: DashMap<String, BotFactory>,
}

impl BotClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Fails with `DuplicateClass` if the name is taken.
    pub fn register<F, B>(&self, class_name: &str, factory: F) -> Result<(), SupervisorError>
    where
        F: Fn(BotDeps) -> Result<B, BotError> + Send + Sync + 'static,
        B: BotBehavior,
    {
        match self.classes.entry(class_name.to_string()) {
            Entry::Occupied(_) => Err(SupervisorError::DuplicateClass(class_name.to_string())),
            Entry::Vacant(slot) => {
                let factory: BotFactory = Arc::new(move |deps| {
                    let behavior: Arc<dyn BotBehaviorDyn> = Arc::new(factory(deps)?);
                    Ok(behavior)
                });
                slot.insert(factory);
                info!(class = %class_name, "registered bot class");
                Ok(())
            }
        }
    }

    pub fn get(&self, class_name: &str) -> Option<BotFactory> {
        self.classes
            .get(class_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    /// Registered class names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for BotClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClassRegistry")
            .field("classes", &self.names())
            .finish()
    }
}
