//! Login attempt limiter keyed by normalized email

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Login limiter configuration
#[derive(Debug, Clone)]
pub struct LoginLimiterConfig {
    /// Failed attempts allowed inside one window
    pub max_attempts: u32,
    /// Window length
    pub window: Duration,
    /// Lockout once the window budget is spent
    pub lockout: Duration,
}

impl Default for LoginLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            lockout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct AttemptWindow {
    failures: u32,
    window_started: Instant,
    locked_until: Option<Instant>,
}

/// Tracks failed logins per account and locks accounts that exceed the budget
#[derive(Debug, Clone)]
pub struct LoginLimiter {
    config: LoginLimiterConfig,
    entries: Arc<Mutex<HashMap<String, AttemptWindow>>>,
}

impl LoginLimiter {
    pub fn new(config: LoginLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a login for `key` may be attempted now
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now()).await
    }

    /// Record a failed login for `key`
    pub async fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now()).await
    }

    /// Forget the failures of `key` after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    async fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().await;

        let Some(locked_until) = entries.get(key).map(|entry| entry.locked_until) else {
            return true;
        };

        match locked_until {
            Some(until) if now < until => false,
            Some(_) => {
                entries.remove(key);
                true
            }
            None => true,
        }
    }

    async fn record_failure_at(&self, key: &str, now: Instant) {
        let mut entries = self.entries.lock().await;

        // Unlocked entries past their window would restart from zero anyway
        let window = self.config.window;
        entries.retain(|_, entry| match entry.locked_until {
            Some(until) => now < until,
            None => now.duration_since(entry.window_started) < window,
        });

        let entry = entries.entry(key.to_string()).or_insert(AttemptWindow {
            failures: 0,
            window_started: now,
            locked_until: None,
        });

        if now.duration_since(entry.window_started) >= self.config.window {
            entry.failures = 0;
            entry.window_started = now;
        }

        entry.failures += 1;

        if entry.failures >= self.config.max_attempts && entry.locked_until.is_none() {
            entry.locked_until = Some(now + self.config.lockout);
            warn!(
                "Locked logins for {} for {} seconds",
                key,
                self.config.lockout.as_secs()
            );
        }
    }
}
