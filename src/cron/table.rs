use super::job::{CronJob, apply_refresh};
use crate::error::SlotbotError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Backing store of the crontab text.
#[async_trait]
pub trait CronTable: Send + Sync {
    async fn load(&self) -> Result<String, SlotbotError>;

    /// Replaces the whole table.
    async fn save(&self, content: &str) -> Result<(), SlotbotError>;

    /// Removes every job under `prefix` and appends `jobs`, in one read-modify-write.
    ///
    /// Callers serialize concurrent refreshes against the same table.
    async fn refresh(&self, prefix: &str, jobs: &[CronJob]) -> Result<(), SlotbotError> {
        let existing = self.load().await?;
        let updated = apply_refresh(&existing, prefix, jobs);
        if updated == existing {
            debug!(prefix, "Crontab unchanged");
            return Ok(());
        }
        self.save(&updated).await?;
        debug!(prefix, jobs = jobs.len(), "Crontab refreshed");
        Ok(())
    }
}

/// Crontab kept in a plain file; writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileCrontab {
    path: PathBuf,
}

impl FileCrontab {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CronTable for FileCrontab {
    async fn load(&self) -> Result<String, SlotbotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, content: &str) -> Result<(), SlotbotError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// The invoking user's crontab via `crontab -l` / `crontab -`.
#[derive(Debug, Clone, Default)]
pub struct SystemCrontab;

#[async_trait]
impl CronTable for SystemCrontab {
    async fn load(&self) -> Result<String, SlotbotError> {
        let output = Command::new("crontab").arg("-l").output().await?;
        if output.status.success() {
            return String::from_utf8(output.stdout)
                .map_err(|e| SlotbotError::Crontab(format!("crontab is not UTF-8: {e}")));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            return Ok(String::new());
        }
        Err(SlotbotError::Crontab(format!(
            "crontab -l failed ({}): {}",
            output.status,
            stderr.trim()
        )))
    }

    async fn save(&self, content: &str) -> Result<(), SlotbotError> {
        let mut child = Command::new("crontab")
            .arg("-")
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlotbotError::Crontab("crontab stdin unavailable".to_string()))?;
        stdin.write_all(content.as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(SlotbotError::Crontab(format!(
                "crontab - failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
