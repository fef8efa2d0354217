use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Result, bail};
use sitepipe::fs::FileSystem;
use sitepipe::stages::{BundleRequest, Bundler};

/// In-process bundler: concatenates the sources in order, each followed by
/// a newline. Bundles whose name contains `fail_marker` fail.
#[derive(Debug, Clone)]
pub struct ConcatBundler {
    fs: Arc<dyn FileSystem>,
    fail_marker: Option<String>,
}

impl ConcatBundler {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            fail_marker: None,
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }
}

impl Bundler for ConcatBundler {
    fn bundle<'a>(
        &'a self,
        request: &'a BundleRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(marker) = &self.fail_marker {
                if request.name.contains(marker.as_str()) {
                    bail!("simulated bundler failure for {}", request.name);
                }
            }
            let mut out = Vec::new();
            for src in &request.sources {
                out.extend(self.fs.read(src)?);
                out.push(b'\n');
            }
            Ok(out)
        })
    }
}
