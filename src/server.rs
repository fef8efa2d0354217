// src/server.rs

//! Development HTTP server with live reload.
//!
//! Serves the output root, disables caching, and injects a small script
//! into every HTML response that listens on `/__livereload` (server-sent
//! events) and reloads the page when the dev loop finishes a rebuild.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::middleware;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, info, warn};

pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Largest HTML body the reload script is injected into.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

pub const LIVERELOAD_SCRIPT: &str = r#"<script>
(function () {
  var source = new EventSource('/__livereload');
  source.onmessage = function (event) {
    if (event.data === 'reload') { window.location.reload(); }
  };
})();
</script>"#;

/// Shared server state: the reload broadcaster.
#[derive(Debug, Clone)]
pub struct ServerState {
    reload_tx: broadcast::Sender<()>,
}

impl ServerState {
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self { reload_tx }
    }

    /// Tell every connected page to reload. Returns the number of pages
    /// notified.
    pub fn notify_reload(&self) -> usize {
        self.reload_tx.send(()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.reload_tx.subscribe()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_router(dist_dir: &Path, state: Arc<ServerState>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload_handler))
        .fallback_service(ServeDir::new(dist_dir))
        .layer(middleware::map_response(inject_livereload))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("max-age=0, no-cache"),
        ))
        .with_state(state)
}

async fn livereload_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe())
        .filter_map(|msg| msg.ok().map(|()| Ok(Event::default().data("reload"))));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

async fn inject_livereload(response: Response) -> Response {
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "could not buffer html response");
            return (parts.status, "failed to read response body").into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}

/// Insert the reload script before the last `</body>`, or append it.
pub fn inject_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{LIVERELOAD_SCRIPT}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{LIVERELOAD_SCRIPT}"),
    }
}

/// Serve `dist_dir` on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    dist_dir: &Path,
    state: Arc<ServerState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(dist_dir, state);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;

    info!("dev server running at http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("dev server error")?;
    debug!("dev server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_goes_before_closing_body() {
        let out = inject_script("<html><body><p>x</p></body></html>");
        assert!(out.starts_with("<html><body><p>x</p><script>"));
        assert!(out.ends_with("</script></body></html>"));
    }

    #[test]
    fn fragments_get_the_script_appended() {
        let out = inject_script("<p>x</p>");
        assert!(out.starts_with("<p>x</p><script>"));
    }

    #[test]
    fn reload_without_listeners_notifies_nobody() {
        let state = ServerState::new();
        assert_eq!(state.notify_reload(), 0);
        let _rx = state.subscribe();
        assert_eq!(state.notify_reload(), 1);
    }
}
