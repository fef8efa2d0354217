// src/devloop/controller.rs

//! Async shell around [`DevLoopCore`]: runs builds and handlers through the
//! engine, serves the output root and feeds watcher events into the core.

use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info};

use crate::dag::Step;
use crate::devloop::core::{DevCommand, DevLoopCore};
use crate::devloop::handlers::HandlerTable;
use crate::engine::{RunSummary, TriggerReason};
use crate::pipeline::{build_step, run_plan};
use crate::server::{ServerState, serve};
use crate::stages::StageContext;
use crate::types::Category;
use crate::watch::{CategoryMatchers, WatchEvent, spawn_watcher};

/// Which plan a spawned task is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Running {
    Build,
    Handler(Category),
}

/// Build once, then serve the output root and rebuild on changes until
/// Ctrl-C.
pub async fn run_dev_loop(ctx: StageContext) -> Result<()> {
    let matchers = CategoryMatchers::from_globs(&ctx.globs)?;
    let table = HandlerTable::new(matchers.categories());
    info!(categories = ?table.categories().collect::<Vec<_>>(), "watching categories");

    let (events_tx, events_rx) = mpsc::unbounded_channel::<WatchEvent>();
    let _watcher = spawn_watcher(&ctx.project_root, ctx.source_dir(), matchers, events_tx)?;

    let state = Arc::new(ServerState::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let addr = server_addr(&ctx.manifest.server.host, ctx.manifest.server.port)?;
    let server = {
        let dist = ctx.dist_dir();
        let state = Arc::clone(&state);
        let mut rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.wait_for(|stop| *stop).await;
            };
            serve(addr, &dist, state, shutdown).await
        })
    };

    {
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("shutdown requested");
            let _ = tx.send(true);
        });
    }

    let mut controller = Controller {
        core: DevLoopCore::new(table),
        ctx,
        state,
        plans: JoinSet::new(),
        running: HashMap::new(),
    };

    let startup = controller.core.start();
    controller.dispatch(startup);

    let mut stop_rx = shutdown_rx;
    controller
        .drive(events_rx, async move {
            let _ = stop_rx.wait_for(|stop| *stop).await;
        })
        .await;

    let _ = shutdown_tx.send(true);
    match server.await {
        Ok(result) => result,
        Err(join_err) => Err(join_err).context("dev server task panicked"),
    }
}

/// Bind address from the manifest; `host` may be an IPv4 or IPv6 literal.
pub fn server_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .with_context(|| format!("invalid server host '{host}'"))?;
    Ok(SocketAddr::new(ip, port))
}

struct Controller {
    core: DevLoopCore,
    ctx: StageContext,
    state: Arc<ServerState>,
    plans: JoinSet<crate::errors::Result<RunSummary>>,
    running: HashMap<Id, Running>,
}

impl Controller {
    async fn drive(
        &mut self,
        mut events_rx: mpsc::UnboundedReceiver<WatchEvent>,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(event) = events_rx.recv() => {
                    debug!(?event, "watch event received");
                    let commands = self.core.on_event(event);
                    self.dispatch(commands);
                }
                Some(joined) = self.plans.join_next_with_id() => {
                    let (id, summary) = match joined {
                        Ok((id, Ok(summary))) => (id, summary),
                        Ok((id, Err(err))) => {
                            error!(error = %err, "plan could not run");
                            (id, RunSummary::default())
                        }
                        Err(err) => {
                            error!(error = %err, "plan task panicked");
                            (err.id(), RunSummary::default())
                        }
                    };
                    let commands = match self.running.remove(&id) {
                        Some(Running::Build) => self.core.build_finished(&summary),
                        Some(Running::Handler(category)) => {
                            self.core.handler_finished(category, &summary)
                        }
                        None => Vec::new(),
                    };
                    self.dispatch(commands);
                }
            }
        }

        self.plans.shutdown().await;
    }

    fn dispatch(&mut self, commands: Vec<DevCommand>) {
        for command in commands {
            match command {
                DevCommand::RunBuild => {
                    info!(mode = %self.ctx.mode, "initial build");
                    self.spawn(Running::Build, build_step(&self.ctx.manifest));
                }
                DevCommand::RunHandler { event, step } => {
                    debug!(path = %event.path, kind = %event.kind, "running handler");
                    self.spawn(Running::Handler(event.category), step);
                }
                DevCommand::Reload => {
                    let pages = self.state.notify_reload();
                    debug!(pages, "reload broadcast");
                }
            }
        }
    }

    fn spawn(&mut self, kind: Running, step: Step) {
        let ctx = self.ctx.clone();
        let reason = match kind {
            Running::Build => TriggerReason::Manual,
            Running::Handler(_) => TriggerReason::FileWatch,
        };
        let handle = self
            .plans
            .spawn(async move { run_plan(&step, &ctx, reason).await });
        self.running.insert(handle.id(), kind);
    }
}
