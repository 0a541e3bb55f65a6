//! Replay a recorded session through the engine
//!
//! Events come from a JSON Lines file, one object per line:
//!
//! ```text
//! {"event": "enter_game", "name": "Elinu", "server_id": 27}
//! {"event": "packet", "name": "C_LOAD_TOPO_FIN", "data": ""}
//! {"event": "packet", "name": "S_LOAD_CLIENT_ACCOUNT_SETTING", "data": "08009c4eaabbccdd"}
//! {"event": "command", "args": ["status"]}
//! {"event": "wait", "ms": 200}
//! {"event": "disconnect"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Deferred tasks run on
//! tokio timers and are fed back into the engine on the same task, so the
//! engine never sees concurrent calls.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::COMMAND_NAME;
use crate::config::EngineConfig;
use crate::engine::ReconciliationEngine;
use crate::host::{DeferredTask, Host, HookedMessage};
use crate::types::CharacterInfo;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    EnterGame {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        server_id: Option<u32>,
    },
    /// Raw hooked packet; `data` is hex
    Packet {
        name: String,
        #[serde(default)]
        data: String,
        #[serde(default)]
        fake: bool,
    },
    Command {
        #[serde(default)]
        args: Vec<String>,
    },
    Wait {
        ms: u64,
    },
    Disconnect,
}

/// Parse a JSON Lines event log. Packets must name a hooked message; a log
/// recorded with extra hooks would otherwise replay as silent no-ops.
pub fn parse_events(contents: &str) -> Result<Vec<ReplayEvent>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            let event: ReplayEvent = serde_json::from_str(line)
                .with_context(|| format!("Invalid replay event on line {}", idx + 1))?;
            if let ReplayEvent::Packet { name, .. } = &event
                && !HookedMessage::is_hooked(name)
            {
                bail!("Unhooked packet {name} on line {}", idx + 1);
            }
            Ok(event)
        })
        .collect()
}

/// Host that prints chat messages and runs deferred tasks on tokio timers
pub struct ConsoleHost {
    tasks: mpsc::UnboundedSender<DeferredTask>,
    pending: usize,
    pub messages: Vec<String>,
    pub injected: usize,
    echo: bool,
}

impl ConsoleHost {
    pub fn new(tasks: mpsc::UnboundedSender<DeferredTask>, echo: bool) -> Self {
        Self {
            tasks,
            pending: 0,
            messages: Vec::new(),
            injected: 0,
            echo,
        }
    }
}

impl Host for ConsoleHost {
    fn message(&mut self, text: &str) {
        if self.echo {
            println!("[{COMMAND_NAME}] {text}");
        }
        self.messages.push(text.to_string());
    }

    fn inject_to_client(&mut self, buffer: &[u8]) -> Result<()> {
        info!(bytes = buffer.len(), data = %hex::encode(buffer), "Injected packet to client");
        self.injected += 1;
        Ok(())
    }

    fn schedule(&mut self, delay: Duration, task: DeferredTask) {
        debug!(delay_ms = delay.as_millis() as u64, task = ?task.action, "Scheduling deferred task");
        self.pending += 1;
        let tx = self.tasks.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the replay finished; the task is moot
            let _ = tx.send(task);
        });
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub consumed: usize,
    pub injected: usize,
    pub messages: Vec<String>,
}

fn run_task(engine: &mut ReconciliationEngine<ConsoleHost>, task: DeferredTask) {
    let host = engine.host_mut();
    host.pending = host.pending.saturating_sub(1);
    engine.run_deferred(task);
}

/// Feed every event through a fresh engine, then let outstanding timers fire
pub async fn run(config: EngineConfig, events: Vec<ReplayEvent>, echo: bool) -> Result<ReplaySummary> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut engine = ReconciliationEngine::new(config, ConsoleHost::new(tx, echo));
    let mut summary = ReplaySummary {
        events: events.len(),
        ..ReplaySummary::default()
    };

    for event in events {
        while let Ok(task) = rx.try_recv() {
            run_task(&mut engine, task);
        }

        match event {
            ReplayEvent::EnterGame { name, server_id } => {
                engine.on_enter_game(&CharacterInfo { name, server_id });
            }
            ReplayEvent::Packet { name, data, fake } => {
                let buffer = hex::decode(data.trim())
                    .with_context(|| format!("Packet {name} carries invalid hex"))?;
                if !engine.on_packet(&name, &buffer, fake) {
                    info!(message = %name, "Packet consumed by engine");
                    summary.consumed += 1;
                }
            }
            ReplayEvent::Command { args } => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                engine.run_command(&args);
            }
            ReplayEvent::Wait { ms } => {
                let deadline = tokio::time::sleep(Duration::from_millis(ms));
                tokio::pin!(deadline);
                loop {
                    tokio::select! {
                        _ = &mut deadline => break,
                        Some(task) = rx.recv() => run_task(&mut engine, task),
                    }
                }
            }
            ReplayEvent::Disconnect => engine.on_return_to_lobby(),
        }
    }

    while engine.host().pending > 0 {
        match rx.recv().await {
            Some(task) => run_task(&mut engine, task),
            None => {
                warn!("Task channel closed with deferred tasks outstanding");
                break;
            }
        }
    }

    let host = engine.host_mut();
    summary.injected = host.injected;
    summary.messages = std::mem::take(&mut host.messages);
    Ok(summary)
}
