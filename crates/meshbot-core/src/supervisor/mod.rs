//! Process-wide bot management: class registry, bot set, inbound routing.

pub mod bot_supervisor;
pub mod classes;
pub mod report;

pub use bot_supervisor::BotSupervisor;
pub use classes::{BotClassRegistry, BotFactory};
pub use report::{BatchFailure, BatchReport, RecipientOutcome, RouteReport};
