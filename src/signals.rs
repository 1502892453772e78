use chrono::{Datelike, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, SentinelError};
use crate::models::{LocationStatus, SignalSnapshot};

/// A clock before this year cannot be a sane wall clock.
pub const MIN_PLAUSIBLE_YEAR: i32 = 2024;

// Namespaced so it cannot collide with other state files in the same dir.
const DEVICE_ID_FILE: &str = "pay_sentinel_device_id";

/// Gathers the environmental context the risk pipeline feeds on: a stable
/// device identifier, a best-effort location fix, and a clock-sanity flag.
/// The location may resolve after collection starts; snapshots always see
/// the latest state, and subscribers are notified when it changes.
#[derive(Clone)]
pub struct SignalCollector {
    inner: Arc<RwLock<SignalSnapshot>>,
    changed: broadcast::Sender<()>,
}

impl SignalCollector {
    pub fn collect(config: &Config) -> Result<Self> {
        let device_id = load_or_create_device_id(Path::new(&config.state_dir))?;

        let location_status = if config.geo_probe_url.is_some() {
            LocationStatus::Detecting
        } else {
            LocationStatus::Unsupported
        };

        let (changed, _) = broadcast::channel(8);
        let collector = SignalCollector {
            inner: Arc::new(RwLock::new(SignalSnapshot {
                device_id,
                latitude: 0.0,
                longitude: 0.0,
                location_status,
                time_synced: check_time_sanity(),
            })),
            changed,
        };

        if let Some(url) = config.geo_probe_url.clone() {
            let inner = collector.inner.clone();
            let changed = collector.changed.clone();
            let timeout = Duration::from_millis(config.geo_timeout_ms);
            tokio::spawn(async move {
                resolve_location(url, timeout, inner).await;
                let _ = changed.send(());
            });
        }

        Ok(collector)
    }

    pub fn snapshot(&self) -> SignalSnapshot {
        self.inner.read().clone()
    }

    /// Fires after any asynchronous signal update, e.g. a late location fix.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }
}

pub fn check_time_sanity() -> bool {
    Utc::now().year() > MIN_PLAUSIBLE_YEAR
}

fn load_or_create_device_id(dir: &Path) -> Result<String> {
    fs::create_dir_all(dir)?;

    let path = dir.join(DEVICE_ID_FILE);
    if let Ok(existing) = fs::read_to_string(&path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let device_id = format!("device_{}", Uuid::new_v4().simple());
    fs::write(&path, &device_id)?;
    info!(%device_id, "generated new device identifier");
    Ok(device_id)
}

#[derive(Debug, Deserialize)]
struct GeoFix {
    latitude: f64,
    longitude: f64,
}

/// The probe is bounded: on timeout, transport failure or a bad body the
/// fix stays at (0, 0) and the status moves to Denied so callers never
/// mistake the fallback for a verified location.
async fn resolve_location(url: String, timeout: Duration, inner: Arc<RwLock<SignalSnapshot>>) {
    let fetch = async {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SentinelError::Api(response.status().as_u16()));
        }
        Ok::<GeoFix, SentinelError>(response.json().await?)
    };

    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(fix)) => {
            let mut snapshot = inner.write();
            snapshot.latitude = fix.latitude;
            snapshot.longitude = fix.longitude;
            snapshot.location_status = LocationStatus::Verified;
            debug!(lat = fix.latitude, lon = fix.longitude, "location verified");
        }
        Ok(Err(e)) => {
            warn!("location probe failed: {e}");
            inner.write().location_status = LocationStatus::Denied;
        }
        Err(_) => {
            warn!("location probe timed out");
            inner.write().location_status = LocationStatus::Denied;
        }
    }
}
