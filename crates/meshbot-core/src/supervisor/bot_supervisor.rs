//! BotSupervisor: the set of bot instances and inbound routing.
//!
//! The name -> bot map lives behind an async `RwLock`. Creation and removal
//! take the write lock, so routing (read lock) never observes a half-built
//! bot. Lifecycle calls clone the bot's `Arc` and release the lock before
//! awaiting, so a slow `stop()` never blocks routing to other bots.
//!
//! A bot being removed keeps its name reserved until its run-loop has been
//! joined, so a new bot can never share a name with a still-live one.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::DashSet;
use futures_util::FutureExt;
use futures_util::future::join_all;
use meshbot_types::bot::{BotDescriptor, BotState, validate_bot_name};
use meshbot_types::channel::{ChannelId, ChannelRef};
use meshbot_types::error::{BotError, LinkError, SupervisorError};
use meshbot_types::event::MeshEvent;
use meshbot_types::message::InboundMessage;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::classes::{BotClassRegistry, BotFactory};
use super::report::{BatchFailure, BatchReport, RecipientOutcome, RouteReport};
use crate::bot::{BotBehavior, BotDeps, BotRuntime, BotSettings, DispatchOutcome, panic_message};
use crate::channel::ChannelManager;
use crate::event::EventBus;
use crate::link::BoxNodeLink;

pub struct BotSupervisor {
    link: BoxNodeLink,
    channels: Arc<ChannelManager>,
    classes: Arc<BotClassRegistry>,
    bots: RwLock<BTreeMap<String, Arc<BotRuntime>>>,
    /// Names of bots whose removal is still stopping them.
    removing: DashSet<String>,
    settings: BotSettings,
    events: EventBus,
}

/// Releases a reserved name when removal finishes (or is abandoned).
struct NameReservation<'a> {
    removing: &'a DashSet<String>,
    name: String,
}

impl Drop for NameReservation<'_> {
    fn drop(&mut self) {
        self.removing.remove(&self.name);
    }
}

impl BotSupervisor {
    pub fn new(
        link: BoxNodeLink,
        channels: Arc<ChannelManager>,
        classes: Arc<BotClassRegistry>,
        settings: BotSettings,
        events: EventBus,
    ) -> Self {
        Self {
            link,
            channels,
            classes,
            bots: RwLock::new(BTreeMap::new()),
            removing: DashSet::new(),
            settings,
            events,
        }
    }

    pub fn link(&self) -> &BoxNodeLink {
        &self.link
    }

    pub fn channels(&self) -> &Arc<ChannelManager> {
        &self.channels
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Add a bot class. Fails with `DuplicateClass` on reuse of the name.
    pub fn register_bot_class<F, B>(&self, class_name: &str, factory: F) -> Result<(), SupervisorError>
    where
        F: Fn(BotDeps) -> Result<B, BotError> + Send + Sync + 'static,
        B: BotBehavior,
    {
        self.classes.register(class_name, factory)
    }

    pub fn list_classes(&self) -> Vec<String> {
        self.classes.names()
    }

    /// Create (but do not start) a bot of a registered class.
    pub async fn create_bot(
        &self,
        class_name: &str,
        name: &str,
        channel: ChannelRef,
    ) -> Result<BotDescriptor, SupervisorError> {
        let name = validate_bot_name(name)?;
        let factory = self.factory(class_name)?;

        let mut bots = self.bots.write().await;
        if bots.contains_key(&name) || self.removing.contains(&name) {
            return Err(SupervisorError::DuplicateName(name));
        }

        let deps = BotDeps {
            name: name.clone(),
            channel,
            link: self.link.clone(),
            channels: Arc::clone(&self.channels),
        };
        let behavior = factory(deps.clone())?;
        let runtime = BotRuntime::new(class_name, deps, behavior, self.settings.clone())?
            .with_events(self.events.clone());
        let descriptor = runtime.descriptor().await;
        bots.insert(name, Arc::new(runtime));
        drop(bots);

        info!(
            bot = %descriptor.name,
            class = %class_name,
            channel = %descriptor.channel,
            "created bot"
        );
        self.events.publish(MeshEvent::BotCreated {
            name: descriptor.name.clone(),
            class_name: class_name.to_string(),
            channel: descriptor.channel.clone(),
        });
        Ok(descriptor)
    }

    /// Create a bot on the channel called `channel_name`, creating it if needed.
    pub async fn create_bot_on(
        &self,
        class_name: &str,
        name: &str,
        channel_name: &str,
    ) -> Result<BotDescriptor, SupervisorError> {
        // Fail fast before touching the node's channel table.
        self.factory(class_name)?;
        let name = validate_bot_name(name)?;
        if self.bots.read().await.contains_key(&name) || self.removing.contains(&name) {
            return Err(SupervisorError::DuplicateName(name));
        }

        let channel = self.channels.create_channel(channel_name).await?;
        self.create_bot(class_name, &name, channel).await
    }

    pub async fn start_bot(&self, name: &str) -> Result<BotDescriptor, SupervisorError> {
        let bot = self.runtime(name).await?;
        bot.start().await?;
        Ok(bot.descriptor().await)
    }

    /// Stop a bot. `ShutdownTimeout` is returned but the bot is still stopped.
    pub async fn stop_bot(&self, name: &str) -> Result<BotDescriptor, SupervisorError> {
        let bot = self.runtime(name).await?;
        bot.stop().await?;
        Ok(bot.descriptor().await)
    }

    /// Stop (if running) and forget a bot.
    ///
    /// The bot leaves routing immediately, but its name stays taken until
    /// the stop has completed.
    pub async fn remove_bot(&self, name: &str) -> Result<BotDescriptor, SupervisorError> {
        let (bot, _reservation) = {
            let mut bots = self.bots.write().await;
            let bot = bots
                .remove(name)
                .ok_or_else(|| SupervisorError::NotFound(name.to_string()))?;
            self.removing.insert(name.to_string());
            let reservation = NameReservation {
                removing: &self.removing,
                name: name.to_string(),
            };
            (bot, reservation)
        };

        if let Err(error) = bot.stop().await {
            warn!(bot = %name, %error, "bot did not stop cleanly during removal");
        }
        info!(bot = %name, "removed bot");
        self.events.publish(MeshEvent::BotRemoved {
            name: name.to_string(),
        });
        Ok(bot.descriptor().await)
    }

    /// Start every bot that is not running. One failure never blocks the rest.
    pub async fn start_all(&self) -> BatchReport {
        let mut report = BatchReport::default();
        for bot in self.snapshot().await {
            if bot.state().await == BotState::Running {
                report.skipped.push(bot.name().to_string());
                continue;
            }
            match bot.start().await {
                Ok(()) => report.succeeded.push(bot.name().to_string()),
                Err(error) => {
                    warn!(bot = %bot.name(), %error, "failed to start bot");
                    report.failed.push(BatchFailure {
                        name: bot.name().to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }
        info!(
            started = report.succeeded.len(),
            failed = report.failed.len(),
            "start_all finished"
        );
        report
    }

    /// Stop every running bot concurrently.
    pub async fn stop_all(&self) -> BatchReport {
        let bots = self.snapshot().await;
        let results = join_all(bots.iter().map(|bot| async move {
            if bot.state().await != BotState::Running {
                return (bot.name(), None);
            }
            (bot.name(), Some(bot.stop().await))
        }))
        .await;

        let mut report = BatchReport::default();
        for (name, result) in results {
            match result {
                None => report.skipped.push(name.to_string()),
                Some(Ok(())) => report.succeeded.push(name.to_string()),
                Some(Err(error)) => {
                    warn!(bot = %name, %error, "failed to stop bot");
                    report.failed.push(BatchFailure {
                        name: name.to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }
        info!(
            stopped = report.succeeded.len(),
            failed = report.failed.len(),
            "stop_all finished"
        );
        report
    }

    /// Deliver `message` to every running bot bound to its channel.
    ///
    /// Recipients are dispatched concurrently and isolated from each other.
    pub async fn route_inbound(&self, message: &InboundMessage) -> RouteReport {
        let candidates: Vec<Arc<BotRuntime>> = self
            .bots
            .read()
            .await
            .values()
            .filter(|bot| bot.channel().id == message.channel_id)
            .cloned()
            .collect();

        let outcomes = join_all(candidates.iter().map(|bot| async move {
            if bot.state().await != BotState::Running {
                return None;
            }
            let outcome = AssertUnwindSafe(bot.handle_message(message))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| DispatchOutcome::Failed {
                    command: String::new(),
                    error: panic_message(panic.as_ref()),
                });
            Some(RecipientOutcome {
                bot: bot.name().to_string(),
                outcome,
            })
        }))
        .await;

        RouteReport {
            channel: message.channel_id,
            recipients: outcomes.into_iter().flatten().collect(),
        }
    }

    /// Operator-initiated send, straight through to the link.
    pub async fn send_message(&self, text: &str, channel: ChannelId) -> Result<(), LinkError> {
        self.link.send(text, channel).await?;
        info!(%channel, "operator message sent");
        self.events.publish(MeshEvent::MessageSent {
            channel,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Descriptors of all bots, sorted by name.
    pub async fn list_bots(&self) -> Vec<BotDescriptor> {
        let bots = self.snapshot().await;
        let mut descriptors = Vec::with_capacity(bots.len());
        for bot in bots {
            descriptors.push(bot.descriptor().await);
        }
        descriptors
    }

    pub async fn get_bot(&self, name: &str) -> Result<BotDescriptor, SupervisorError> {
        Ok(self.runtime(name).await?.descriptor().await)
    }

    pub async fn bot_count(&self) -> usize {
        self.bots.read().await.len()
    }

    async fn runtime(&self, name: &str) -> Result<Arc<BotRuntime>, SupervisorError> {
        self.bots
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SupervisorError::NotFound(name.to_string()))
    }

    async fn snapshot(&self) -> Vec<Arc<BotRuntime>> {
        self.bots.read().await.values().cloned().collect()
    }

    fn factory(&self, class_name: &str) -> Result<BotFactory, SupervisorError> {
        self.classes
            .get(class_name)
            .ok_or_else(|| SupervisorError::UnknownClass(class_name.to_string()))
    }
}

impl std::fmt::Debug for BotSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSupervisor")
            .field("link", &self.link)
            .field("classes", &self.classes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use meshbot_types::error::CommandError;

    use super::*;
    use crate::bot::{BotContext, RunContext};
    use crate::command::{CommandRegistry, Invocation};
    use crate::testing::{EchoBot, Harness};

    fn supervisor(harness: &Harness) -> BotSupervisor {
        let classes = Arc::new(BotClassRegistry::new());
        classes.register("EchoBot", |_deps| Ok(EchoBot)).unwrap();
        let settings = BotSettings {
            announce_lifecycle: false,
            shutdown_timeout: Duration::from_millis(200),
            ..BotSettings::default()
        };
        BotSupervisor::new(
            harness.link.clone(),
            Arc::clone(&harness.channels),
            classes,
            settings,
            EventBus::new(64),
        )
    }

    /// Counts every `/ping` it handles.
    struct Counter {
        hits: Arc<AtomicUsize>,
    }

    impl BotBehavior for Counter {
        fn register_commands(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
            let hits = Arc::clone(&self.hits);
            commands.register("ping", "Count", move |_ctx: BotContext, _inv: Invocation| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        }
    }

    struct Stubborn;

    impl BotBehavior for Stubborn {
        async fn run_loop(&self, _ctx: &RunContext) -> Result<(), BotError> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(())
        }
    }

    /// Keeps talking for a while after it is asked to stop.
    struct SlowExit;

    impl BotBehavior for SlowExit {
        async fn run_loop(&self, ctx: &RunContext) -> Result<(), BotError> {
            ctx.stopped().await;
            tokio::time::sleep(Duration::from_millis(150)).await;
            ctx.say("old instance still alive").await;
            Ok(())
        }
    }

    /// Panics on `/ping`.
    struct Exploding;

    impl BotBehavior for Exploding {
        fn register_commands(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
            commands.register("ping", "Explode", |_ctx: BotContext, _inv: Invocation| async move {
                if true {
                    panic!("sensor bus fault");
                }
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn create_from_registered_classes() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        sup.register_bot_class("Other", |_deps| Ok(EchoBot)).unwrap();

        for (i, class) in ["EchoBot", "Other"].iter().enumerate() {
            let descriptor = sup
                .create_bot(class, &format!("bot{i}"), ChannelRef::primary())
                .await
                .unwrap();
            assert_eq!(descriptor.class_name, *class);
            assert_eq!(descriptor.state, BotState::Created);
        }
        assert_eq!(sup.bot_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_class_is_rejected() {
        let harness = Harness::new();
        let sup = supervisor(&harness);

        let err = sup
            .create_bot("Nope", "x", ChannelRef::primary())
            .await
            .unwrap_err();
        assert!(matches!(err, SupervisorError::UnknownClass(name) if name == "Nope"));
        assert_eq!(sup.bot_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_class_registration_is_rejected() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        assert!(matches!(
            sup.register_bot_class("EchoBot", |_deps| Ok(EchoBot)),
            Err(SupervisorError::DuplicateClass(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_name_leaves_original_untouched() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let original = sup
            .create_bot("EchoBot", "E1", ChannelRef::new(1, "test"))
            .await
            .unwrap();

        let err = sup
            .create_bot("EchoBot", "E1", ChannelRef::new(2, "other"))
            .await
            .unwrap_err();

        assert!(matches!(err, SupervisorError::DuplicateName(name) if name == "E1"));
        let current = sup.get_bot("E1").await.unwrap();
        assert_eq!(current.channel, original.channel);
        assert_eq!(current.state, original.state);
    }

    #[tokio::test]
    async fn invalid_name_is_rejected() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        assert!(matches!(
            sup.create_bot("EchoBot", "  ", ChannelRef::primary()).await,
            Err(SupervisorError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn unknown_bot_is_not_found() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        assert!(matches!(sup.start_bot("ghost").await, Err(SupervisorError::NotFound(_))));
        assert!(matches!(sup.stop_bot("ghost").await, Err(SupervisorError::NotFound(_))));
        assert!(matches!(sup.remove_bot("ghost").await, Err(SupervisorError::NotFound(_))));
    }

    #[tokio::test]
    async fn stop_on_stopped_bot_is_a_no_op() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        sup.create_bot("EchoBot", "E1", ChannelRef::primary()).await.unwrap();
        sup.start_bot("E1").await.unwrap();

        assert_eq!(sup.stop_bot("E1").await.unwrap().state, BotState::Stopped);
        assert_eq!(sup.stop_bot("E1").await.unwrap().state, BotState::Stopped);
    }

    #[tokio::test]
    async fn start_twice_propagates_already_running() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        sup.create_bot("EchoBot", "E1", ChannelRef::primary()).await.unwrap();
        sup.start_bot("E1").await.unwrap();

        assert!(matches!(
            sup.start_bot("E1").await,
            Err(SupervisorError::Bot(BotError::AlreadyRunning(_)))
        ));
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn routing_respects_channel() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let a_hits = Arc::new(AtomicUsize::new(0));
        let b_hits = Arc::new(AtomicUsize::new(0));
        {
            let a_hits = Arc::clone(&a_hits);
            sup.register_bot_class("CounterA", move |_deps| {
                Ok(Counter {
                    hits: Arc::clone(&a_hits),
                })
            })
            .unwrap();
            let b_hits = Arc::clone(&b_hits);
            sup.register_bot_class("CounterB", move |_deps| {
                Ok(Counter {
                    hits: Arc::clone(&b_hits),
                })
            })
            .unwrap();
        }
        sup.create_bot("CounterA", "A", ChannelRef::new(1, "one")).await.unwrap();
        sup.create_bot("CounterB", "B", ChannelRef::new(2, "two")).await.unwrap();
        sup.start_all().await;

        let report = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/ping"))
            .await;

        assert_eq!(report.recipient_names(), vec!["A"]);
        assert_eq!(a_hits.load(Ordering::SeqCst), 1);
        assert_eq!(b_hits.load(Ordering::SeqCst), 0);
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn fan_out_to_every_bot_on_channel() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let hits = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&hits);
        sup.register_bot_class("Counter", move |_deps| {
            Ok(Counter {
                hits: Arc::clone(&shared),
            })
        })
        .unwrap();
        sup.create_bot("Counter", "A", ChannelRef::new(1, "one")).await.unwrap();
        sup.create_bot("Counter", "C", ChannelRef::new(1, "one")).await.unwrap();
        sup.start_all().await;

        let report = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/ping"))
            .await;

        assert_eq!(report.recipient_names(), vec!["A", "C"]);
        assert_eq!(report.handled(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn failing_recipient_does_not_affect_others() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let hits = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&hits);
        sup.register_bot_class("Counter", move |_deps| {
            Ok(Counter {
                hits: Arc::clone(&shared),
            })
        })
        .unwrap();
        sup.register_bot_class("Exploding", |_deps| Ok(Exploding)).unwrap();
        sup.create_bot("Counter", "A", ChannelRef::new(1, "one")).await.unwrap();
        sup.create_bot("Exploding", "B", ChannelRef::new(1, "one")).await.unwrap();
        sup.start_all().await;

        let report = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/ping"))
            .await;

        assert_eq!(report.recipient_names(), vec!["A", "B"]);
        assert_eq!(report.handled(), 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            &report.recipients[1].outcome,
            DispatchOutcome::Failed { error, .. } if error.contains("sensor bus fault")
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Both keep receiving afterwards.
        let again = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/ping"))
            .await;
        assert_eq!(again.recipients.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        for bot in sup.list_bots().await {
            assert_eq!(bot.state, BotState::Running);
        }
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn stopped_bots_receive_nothing() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        sup.create_bot("EchoBot", "E1", ChannelRef::new(1, "one")).await.unwrap();

        let report = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/echo hi"))
            .await;

        assert!(report.recipients.is_empty());
        assert!(harness.recorder.sent().is_empty());
    }

    #[tokio::test]
    async fn help_and_unknown_command_resolution() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        sup.create_bot("EchoBot", "E1", ChannelRef::new(1, "one")).await.unwrap();
        sup.start_bot("E1").await.unwrap();

        let help = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/help"))
            .await;
        assert_eq!(
            help.recipients[0].outcome,
            DispatchOutcome::Handled {
                command: "help".to_string()
            }
        );

        let nope = sup
            .route_inbound(&InboundMessage::new("!abc", 1, "/nope"))
            .await;
        assert_eq!(
            nope.recipients[0].outcome,
            DispatchOutcome::Unknown {
                command: "nope".to_string()
            }
        );
        assert_eq!(sup.get_bot("E1").await.unwrap().state, BotState::Running);
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn echo_bot_scenario() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let test = harness.channels.create_channel("test").await.unwrap();
        sup.create_bot("EchoBot", "E1", test.clone()).await.unwrap();
        sup.start_bot("E1").await.unwrap();

        sup.route_inbound(&InboundMessage::new("!abc", test.id, "/echo hi"))
            .await;

        assert_eq!(harness.recorder.sent(), vec![(test.id, "hi".to_string())]);
        assert_eq!(sup.get_bot("E1").await.unwrap().state, BotState::Running);

        let started = tokio::time::Instant::now();
        let stopped = sup.stop_bot("E1").await.unwrap();
        assert!(started.elapsed() <= sup.settings().shutdown_timeout);
        assert_eq!(stopped.state, BotState::Stopped);
    }

    #[tokio::test]
    async fn create_bot_on_creates_channel() {
        let harness = Harness::new();
        let sup = supervisor(&harness);

        let descriptor = sup.create_bot_on("EchoBot", "E1", "test").await.unwrap();

        assert_eq!(descriptor.channel.name, "test");
        assert_eq!(
            harness.channels.create_channel("test").await.unwrap(),
            descriptor.channel
        );
    }

    #[tokio::test]
    async fn create_bot_on_unknown_class_leaves_channels_alone() {
        let harness = Harness::new();
        let sup = supervisor(&harness);

        assert!(sup.create_bot_on("Nope", "E1", "test").await.is_err());
        assert_eq!(harness.channels.list_channels().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_reports_collect_failures() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        sup.register_bot_class("Stubborn", |_deps| Ok(Stubborn)).unwrap();
        sup.create_bot("EchoBot", "E1", ChannelRef::primary()).await.unwrap();
        sup.create_bot("Stubborn", "S1", ChannelRef::primary()).await.unwrap();

        let started = sup.start_all().await;
        assert_eq!(started.succeeded, vec!["E1".to_string(), "S1".to_string()]);
        assert!(started.is_success());

        let again = sup.start_all().await;
        assert_eq!(again.skipped.len(), 2);

        let stopped = sup.stop_all().await;
        assert_eq!(stopped.succeeded, vec!["E1".to_string()]);
        assert_eq!(stopped.failed.len(), 1);
        assert_eq!(stopped.failed[0].name, "S1");

        for bot in sup.list_bots().await {
            assert_eq!(bot.state, BotState::Stopped);
        }
    }

    #[tokio::test]
    async fn remove_stops_and_forgets() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let mut events = sup.events().subscribe();
        sup.create_bot("EchoBot", "E1", ChannelRef::primary()).await.unwrap();
        sup.start_bot("E1").await.unwrap();

        let removed = sup.remove_bot("E1").await.unwrap();

        assert_eq!(removed.state, BotState::Stopped);
        assert!(sup.list_bots().await.is_empty());
        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(serde_json::to_value(&event).unwrap()["type"].clone());
        }
        assert_eq!(
            kinds,
            vec!["bot_created", "bot_started", "bot_stopped", "bot_removed"]
        );
    }

    #[tokio::test]
    async fn removed_name_stays_taken_until_stop_completes() {
        let harness = Harness::new();
        let sup = Arc::new(supervisor(&harness));
        sup.register_bot_class("SlowExit", |_deps| Ok(SlowExit)).unwrap();
        sup.create_bot("SlowExit", "X", ChannelRef::primary()).await.unwrap();
        sup.start_bot("X").await.unwrap();

        let removal = tokio::spawn({
            let sup = Arc::clone(&sup);
            async move { sup.remove_bot("X").await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            sup.create_bot("EchoBot", "X", ChannelRef::primary()).await,
            Err(SupervisorError::DuplicateName(name)) if name == "X"
        ));
        assert!(matches!(
            sup.create_bot_on("EchoBot", "X", "test").await,
            Err(SupervisorError::DuplicateName(_))
        ));
        assert!(matches!(sup.start_bot("X").await, Err(SupervisorError::NotFound(_))));

        let removed = removal.await.unwrap().unwrap();
        assert_eq!(removed.state, BotState::Stopped);
        assert_eq!(harness.recorder.sent_texts(), vec!["old instance still alive"]);

        let replacement = sup
            .create_bot("EchoBot", "X", ChannelRef::primary())
            .await
            .unwrap();
        assert_eq!(replacement.class_name, "EchoBot");
    }

    #[tokio::test]
    async fn send_message_publishes_event() {
        let harness = Harness::new();
        let sup = supervisor(&harness);
        let mut events = sup.events().subscribe();

        sup.send_message("hello mesh", ChannelId(3)).await.unwrap();

        assert_eq!(harness.recorder.sent(), vec![(ChannelId(3), "hello mesh".to_string())]);
        assert!(matches!(
            events.try_recv().unwrap(),
            MeshEvent::MessageSent { channel: ChannelId(3), .. }
        ));
    }
}
