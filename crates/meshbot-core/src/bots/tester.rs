//! TestBot: link diagnostics driven by `/test` and summarised by `/report`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use meshbot_types::error::{BotError, CommandError};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::bot::{BotBehavior, BotContext, BotDeps};
use crate::command::{CommandRegistry, Invocation};

const THROUGHPUT_PAYLOAD_BYTES: usize = 200;
const THROUGHPUT_DURATION: Duration = Duration::from_secs(10);
const THROUGHPUT_SPACING: Duration = Duration::from_millis(500);
const LATENCY_SAMPLES: usize = 5;
const LATENCY_SPACING: Duration = Duration::from_secs(1);

/// The diagnostics `/test` can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Ping,
    Throughput,
    Latency,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Ping => write!(f, "ping"),
            TestKind::Throughput => write!(f, "throughput"),
            TestKind::Latency => write!(f, "latency"),
        }
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ping" => Ok(TestKind::Ping),
            "throughput" => Ok(TestKind::Throughput),
            "latency" => Ok(TestKind::Latency),
            other => Err(other.to_string()),
        }
    }
}

/// Latest result per test kind, in first-run order.
#[derive(Debug, Default)]
struct TestResults {
    entries: Vec<(TestKind, String)>,
}

impl TestResults {
    fn record(&mut self, kind: TestKind, result: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = result,
            None => self.entries.push((kind, result)),
        }
    }
}

#[derive(Debug)]
pub struct TestBot {
    results: Arc<Mutex<TestResults>>,
}

impl TestBot {
    pub const CLASS_NAME: &'static str = "TestBot";

    pub fn new(_deps: BotDeps) -> Result<Self, BotError> {
        Ok(Self {
            results: Arc::new(Mutex::new(TestResults::default())),
        })
    }
}

impl BotBehavior for TestBot {
    fn register_commands(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
        let results = Arc::clone(&self.results);
        commands.register(
            "test",
            "Run a test (ping, throughput, latency)",
            move |ctx, invocation| run_test(ctx, invocation, Arc::clone(&results)),
        )?;

        let results = Arc::clone(&self.results);
        commands.register(
            "report",
            "Show the last test report",
            move |ctx, _invocation| report(ctx, Arc::clone(&results)),
        )?;
        Ok(())
    }
}

async fn run_test(
    ctx: BotContext,
    invocation: Invocation,
    results: Arc<Mutex<TestResults>>,
) -> Result<(), CommandError> {
    let Some(requested) = invocation.arg(0) else {
        ctx.send("Please specify a test: ping, throughput, latency")
            .await?;
        return Ok(());
    };
    let kind = match requested.parse::<TestKind>() {
        Ok(kind) => kind,
        Err(unknown) => {
            ctx.send(format!("Unknown test type: {unknown}")).await?;
            return Ok(());
        }
    };

    ctx.send(format!("Starting {kind} test...")).await?;
    let result = match kind {
        TestKind::Ping => ping(&ctx).await,
        TestKind::Throughput => throughput(&ctx).await,
        TestKind::Latency => latency(&ctx).await,
    };
    results.lock().await.record(kind, result.clone());
    ctx.send(result).await?;
    Ok(())
}

async fn report(ctx: BotContext, results: Arc<Mutex<TestResults>>) -> Result<(), CommandError> {
    let text = {
        let results = results.lock().await;
        if results.entries.is_empty() {
            "No test results available".to_string()
        } else {
            let mut text = "Test Results:\n".to_string();
            for (kind, result) in &results.entries {
                text.push_str(&format!("{kind}: {result}\n"));
            }
            text
        }
    };
    ctx.send(text).await?;
    Ok(())
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

async fn ping(ctx: &BotContext) -> String {
    let started = Instant::now();
    match ctx.send("PING").await {
        Ok(()) => format!("Ping successful in {:.2}ms", millis(started.elapsed())),
        Err(_) => "Ping failed".to_string(),
    }
}

async fn throughput(ctx: &BotContext) -> String {
    let payload = "X".repeat(THROUGHPUT_PAYLOAD_BYTES);
    let started = Instant::now();
    let mut sent = 0usize;

    while started.elapsed() < THROUGHPUT_DURATION {
        if ctx
            .send(format!("THROUGHPUT-{sent}: {payload}"))
            .await
            .is_ok()
        {
            sent += 1;
        }
        tokio::time::sleep(THROUGHPUT_SPACING).await;
    }

    if sent == 0 {
        return "Throughput test failed - no messages sent".to_string();
    }
    let duration = started.elapsed().as_secs_f64();
    let bytes = sent * THROUGHPUT_PAYLOAD_BYTES;
    format!(
        "Sent {sent} messages ({bytes} bytes) in {duration:.2}s = {:.2} bytes/s",
        bytes as f64 / duration
    )
}

async fn latency(ctx: &BotContext) -> String {
    let mut samples = Vec::with_capacity(LATENCY_SAMPLES);
    for i in 0..LATENCY_SAMPLES {
        let started = Instant::now();
        if ctx.send(format!("LATENCY-{i}")).await.is_ok() {
            samples.push(millis(started.elapsed()));
        }
        tokio::time::sleep(LATENCY_SPACING).await;
    }

    if samples.is_empty() {
        return "Latency test failed - no responses received".to_string();
    }
    let avg = samples.iter().sum::<f64>() / samples.len() as f64;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!("Latency: avg={avg:.2}ms, min={min:.2}ms, max={max:.2}ms")
}
