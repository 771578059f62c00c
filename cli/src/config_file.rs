//! JSON persistence and hot-reload for [`GatewayConfig`], grounded in the
//! teacher's `Config::try_load` / `save_default` / `watch_config_file`
//! (`src/config.rs`) — rebuilding a fresh immutable `GatewayConfig` and
//! swapping it behind a lock, rather than the teacher's global `OnceLock`
//! singleton, since this binary owns exactly one `Gateway`.

use anyhow::{Context, Result};
use gateway_core::{Gateway, GatewayConfig};
use log::{debug, trace, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub async fn try_load(path: &Path) -> Result<GatewayConfig> {
    debug!("loading config from {}", path.display());
    if !path.exists() {
        warn!("config file not found at {}, writing defaults", path.display());
        save_default(path).await?;
        return Ok(GatewayConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await.with_context(|| format!("reading config file {}", path.display()))?;
    match serde_json::from_str::<GatewayConfig>(&content) {
        Ok(config) => {
            trace!("loaded config: {config:#?}");
            Ok(config)
        }
        Err(e) => {
            warn!("failed to parse config file {}: {e}", path.display());
            save_default(path).await?;
            Ok(GatewayConfig::default())
        }
    }
}

pub async fn save_default(path: &Path) -> Result<()> {
    debug!("writing default config to {}", path.display());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let content = serde_json::to_string_pretty(&GatewayConfig::default())?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Watch `path` for changes and, on each modification, reload the config
/// and swap a freshly built `Gateway` into `state`. Mirrors the teacher's
/// own watcher: a blocking `std::sync::mpsc` channel fed by a
/// `notify::RecommendedWatcher`, drained inside a spawned task.
pub fn watch(path: PathBuf, state: Arc<RwLock<Arc<Gateway>>>) {
    use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
    tokio::spawn(async move {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = match RecommendedWatcher::new(tx, NotifyConfig::default()) {
            Ok(w) => w,
            Err(e) => {
                warn!("failed to start config watcher: {e}");
                return;
            }
        };
        if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
            warn!("failed to watch {}: {e}", path.display());
            return;
        }

        for res in rx {
            let Ok(event) = res else {
                warn!("config watcher channel error");
                continue;
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                trace!("ignoring config file event: {event:?}");
                continue;
            }
            debug!("config file changed, reloading");
            match try_load(&path).await {
                Ok(config) => {
                    let gateway = Arc::new(Gateway::new(config, gateway_core::DefaultBackendParser));
                    *state.write().await = gateway;
                }
                Err(e) => warn!("failed to reload config: {e}"),
            }
        }
    });
}
