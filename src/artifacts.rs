//! Debug artifact sinks
//!
//! The pipeline hands every intermediate text (payloads, prompts, raw and
//! sanitized replies, normalized drafts, validation reports) to an
//! [`ArtifactSink`]. Sinks are write-only: nothing they do feeds back into
//! generation, and failures are logged rather than returned.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

pub trait ArtifactSink: Send + Sync {
    /// Store `content` under a short descriptive `name`
    fn record(&self, name: &str, content: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ArtifactSink for NoopSink {
    fn record(&self, _name: &str, _content: &str) {}
}

/// Writes numbered files into a per-run directory `<base>/<timestamp>-<uuid>/`
#[derive(Debug)]
pub struct DirSink {
    run_dir: PathBuf,
    counter: AtomicUsize,
}

impl DirSink {
    pub fn create(base: &Path) -> anyhow::Result<Self> {
        let run_id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let run_dir = base.join(run_id);
        std::fs::create_dir_all(&run_dir)?;
        tracing::info!(dir = %run_dir.display(), "writing debug artifacts");
        Ok(Self {
            run_dir,
            counter: AtomicUsize::new(0),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

impl ArtifactSink for DirSink {
    fn record(&self, name: &str, content: &str) {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let file_name: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        let path = self.run_dir.join(format!("{:02}-{}", seq, file_name));

        // Append-only: never overwrite an earlier artifact
        let written = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| std::io::Write::write_all(&mut file, content.as_bytes()));
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), error = %e, "failed to write debug artifact");
        }
    }
}
