//! Application state wiring the engine together.
//!
//! AppState holds the supervisor and the effective configuration. It is
//! shared by the `run` command and every REST handler.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use meshbot_core::bot::BotSettings;
use meshbot_core::bots::register_builtin_classes;
use meshbot_core::channel::ChannelManager;
use meshbot_core::event::{DEFAULT_EVENT_CAPACITY, EventBus};
use meshbot_core::link::BoxNodeLink;
use meshbot_core::supervisor::{BotClassRegistry, BotSupervisor};
use meshbot_infra::channel::SlotChannelDirectory;
use meshbot_types::config::GlobalConfig;
use tracing::{info, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<BotSupervisor>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the channel table, class registry and supervisor around `link`.
    ///
    /// Bots listed in the config are created (not started). A bot that
    /// cannot be created is logged and skipped.
    pub async fn init(
        config: GlobalConfig,
        data_dir: PathBuf,
        link: BoxNodeLink,
    ) -> anyhow::Result<Self> {
        let channels = Arc::new(ChannelManager::new(SlotChannelDirectory::new()));

        let classes = Arc::new(BotClassRegistry::new());
        register_builtin_classes(&classes)?;

        let supervisor = Arc::new(BotSupervisor::new(
            link,
            channels,
            classes,
            BotSettings::from(&config.dispatch),
            EventBus::new(DEFAULT_EVENT_CAPACITY),
        ));

        for bot in &config.bots {
            match supervisor
                .create_bot_on(&bot.class, &bot.name, &bot.channel)
                .await
            {
                Ok(descriptor) => info!(
                    bot = %descriptor.name,
                    channel = %descriptor.channel,
                    "configured bot ready"
                ),
                Err(e) => warn!(
                    bot = %bot.name,
                    class = %bot.class,
                    error = %e,
                    "skipping configured bot"
                ),
            }
        }

        Ok(Self {
            supervisor,
            config: Arc::new(config),
            data_dir,
            started_at: Utc::now(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use meshbot_infra::link::LoopbackLink;
    use meshbot_types::config::DispatchConfig;

    use super::*;

    /// State over a loopback link with the default bots, lifecycle
    /// announcements off so tests only see what they send.
    pub async fn loopback_state() -> (AppState, Arc<LoopbackLink>) {
        let link = Arc::new(LoopbackLink::new());
        let config = GlobalConfig {
            dispatch: DispatchConfig {
                announce_lifecycle: false,
                ..DispatchConfig::default()
            },
            ..GlobalConfig::default()
        };
        let state = AppState::init(
            config,
            PathBuf::from("/tmp/meshbot-test"),
            BoxNodeLink::new(Arc::clone(&link)),
        )
        .await
        .unwrap();
        (state, link)
    }
}
