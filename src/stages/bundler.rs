// src/stages/bundler.rs

//! Script bundler seam.
//!
//! Production uses [`CommandBundler`], which pipes an entry module into an
//! external bundler (esbuild by default) and captures the bundle from its
//! stdout. Tests substitute an in-process implementation.

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::BundlerConfig;
use crate::types::BuildMode;

/// One bundle to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Output path relative to the output root.
    pub name: String,
    /// Absolute paths of the sources, in concatenation order.
    pub sources: Vec<PathBuf>,
    /// Directory module imports are resolved from (the source root).
    pub resolve_dir: PathBuf,
    pub mode: BuildMode,
}

impl BundleRequest {
    /// Entry module importing every source, relative to `resolve_dir`.
    pub fn entry_module(&self) -> String {
        let mut entry = String::new();
        for src in &self.sources {
            let spec = match src.strip_prefix(&self.resolve_dir) {
                Ok(rel) => format!("./{}", rel.to_string_lossy().replace('\\', "/")),
                Err(_) => src.to_string_lossy().replace('\\', "/"),
            };
            entry.push_str(&format!("import {spec:?};\n"));
        }
        entry
    }
}

pub trait Bundler: Send + Sync + Debug {
    /// Produce the bundled bytes for `request`.
    fn bundle<'a>(
        &'a self,
        request: &'a BundleRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

/// Runs the configured external bundler as a child process.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    config: BundlerConfig,
}

impl CommandBundler {
    pub fn new(config: BundlerConfig) -> Self {
        Self { config }
    }

    fn args_for(&self, mode: BuildMode) -> &[String] {
        if mode.is_production() {
            &self.config.prod_args
        } else {
            &self.config.dev_args
        }
    }
}

impl Bundler for CommandBundler {
    fn bundle<'a>(
        &'a self,
        request: &'a BundleRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let args = self.args_for(request.mode);
            debug!(
                bundle = %request.name,
                command = %self.config.command,
                ?args,
                sources = request.sources.len(),
                "invoking bundler"
            );

            let mut child = Command::new(&self.config.command)
                .args(args)
                .current_dir(&request.resolve_dir)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("spawning bundler '{}'", self.config.command))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(request.entry_module().as_bytes())
                    .await
                    .context("writing bundler entry module")?;
                // Dropping stdin closes it so the bundler starts.
            }

            let output = child
                .wait_with_output()
                .await
                .with_context(|| format!("waiting for bundler '{}'", self.config.command))?;

            if !output.status.success() {
                bail!(
                    "bundler exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            Ok(output.stdout)
        })
    }
}
