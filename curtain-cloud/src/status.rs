use std::path::PathBuf;

use curtain_api::EdgeStatus;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::LinkError;

/// Keeps the most recent edge status and appends each one to an audit log.
pub struct StatusBoard {
    latest: Option<EdgeStatus>,
    log_path: PathBuf,
}

impl StatusBoard {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            latest: None,
            log_path: log_path.into(),
        }
    }

    pub fn latest(&self) -> Option<&EdgeStatus> {
        self.latest.as_ref()
    }

    pub async fn record(&mut self, status: EdgeStatus) -> Result<(), LinkError> {
        tracing::info!("Received edge status => {}", describe(&status));

        let line = format!("{} - {}\n", received_at(), describe(&status));
        self.latest = Some(status);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(line.as_bytes()).await?;

        Ok(())
    }
}

pub fn describe(status: &EdgeStatus) -> String {
    format!(
        "Light: {}, Curtain: {}, Rule active: {}",
        status.light_level, status.curtain_state, status.override_active
    )
}

fn received_at() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string())
}
