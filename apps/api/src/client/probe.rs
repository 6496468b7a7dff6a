use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
pub const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Reachability check of a local service.
///
/// Any HTTP response, whatever its status, means reachable. Only a network
/// failure or the 3 s timeout means unreachable.
#[derive(Debug, Clone)]
pub struct ServiceProbe {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    interval: Duration,
}

impl ServiceProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout: PROBE_TIMEOUT,
            interval: PROBE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn check(&self) -> bool {
        match self.http.head(&self.url).timeout(self.timeout).send().await {
            Ok(response) => {
                debug!("{} reachable ({})", self.url, response.status());
                true
            }
            Err(e) => {
                debug!("{} unreachable: {e}", self.url);
                false
            }
        }
    }

    /// Polls every interval, starting immediately. The task stops once every
    /// receiver is dropped.
    pub fn watch(self) -> (watch::Receiver<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let reachable = self.check().await;
                if tx.send(reachable).is_err() {
                    break;
                }
            }
        });
        (rx, handle)
    }
}
