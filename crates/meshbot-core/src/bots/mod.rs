//! Bot classes shipped with meshbot.

pub mod hello;
pub mod tester;

use meshbot_types::error::SupervisorError;

pub use hello::HelloWorldBot;
pub use tester::TestBot;

use crate::supervisor::BotClassRegistry;

/// Register `HelloWorldBot` and `TestBot`.
pub fn register_builtin_classes(classes: &BotClassRegistry) -> Result<(), SupervisorError> {
    classes.register(HelloWorldBot::CLASS_NAME, HelloWorldBot::new)?;
    classes.register(TestBot::CLASS_NAME, TestBot::new)?;
    Ok(())
}
