//! Child process supervision for the backend services

use std::{
    env,
    path::{Path, PathBuf},
};
use tokio::{process::Command, sync::watch, task::JoinSet};
use tracing::{error, info, warn};

/// A backend service binary and the port it should bind
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: &'static str,
    pub binary: PathBuf,
    pub port: u16,
}

impl ServiceSpec {
    /// Use `override_path` when given, otherwise the binary named `name`
    /// next to the running executable
    pub fn resolve(name: &'static str, override_path: Option<&str>, port: u16) -> Self {
        let binary = match override_path.filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => sibling_binary(name),
        };
        Self { name, binary, port }
    }
}

fn sibling_binary(name: &str) -> PathBuf {
    let file_name = format!("{name}{}", env::consts::EXE_SUFFIX);
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join(&file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Running backend services
pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl Supervisor {
    /// Spawn every service; failures are logged and the rest keep running
    pub fn start(specs: Vec<ServiceSpec>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for spec in specs {
            let mut command = Command::new(&spec.binary);
            command.env("PORT", spec.port.to_string()).kill_on_drop(true);

            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    error!("Failed to start {} from {:?}: {}", spec.name, spec.binary, e);
                    continue;
                }
            };

            info!(
                "Started {} (pid {:?}) on port {}",
                spec.name,
                child.id(),
                spec.port
            );

            let mut stop = shutdown.subscribe();
            tasks.spawn(async move {
                tokio::select! {
                    status = child.wait() => match status {
                        Ok(status) => warn!("{} exited unexpectedly: {}", spec.name, status),
                        Err(e) => error!("Failed to wait for {}: {}", spec.name, e),
                    },
                    _ = stop.changed() => {
                        if let Err(e) = child.kill().await {
                            warn!("Failed to stop {}: {}", spec.name, e);
                        } else {
                            info!("Stopped {}", spec.name);
                        }
                    }
                }
            });
        }

        Self { shutdown, tasks }
    }

    /// Number of services still supervised
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Kill every child and wait for it to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!("Supervisor task failed: {}", e);
            }
        }
    }
}
