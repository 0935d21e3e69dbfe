//! Checkpoint persistence for crash recovery.
//!
//! One JSON file per completed stage, named `{run_id}--{stage}.json`. Resume
//! picks the newest matching file by modification time. A corrupt or
//! unreadable checkpoint is a hard error, never silently skipped.

use std::path::{Path, PathBuf};

use tracing::info;

use jobhound_protocol::{AgentFailure, PipelineCheckpoint};

/// Save a checkpoint, creating the directory if needed. Returns the path.
pub async fn save_checkpoint(
    checkpoint: &PipelineCheckpoint,
    checkpoint_dir: &Path,
) -> Result<PathBuf, AgentFailure> {
    tokio::fs::create_dir_all(checkpoint_dir).await.map_err(|e| {
        AgentFailure::checkpoint(format!(
            "Failed to create checkpoint dir {}: {e}",
            checkpoint_dir.display()
        ))
    })?;

    let filename = format!("{}--{}.json", checkpoint.run_id, checkpoint.completed_step);
    let path = checkpoint_dir.join(filename);

    let body = serde_json::to_vec_pretty(checkpoint)
        .map_err(|e| AgentFailure::checkpoint(format!("Failed to serialize checkpoint: {e}")))?;
    tokio::fs::write(&path, body).await.map_err(|e| {
        AgentFailure::checkpoint(format!("Failed to save checkpoint {}: {e}", path.display()))
    })?;

    info!(path = %path.display(), step = %checkpoint.completed_step, "checkpoint saved");
    Ok(path)
}

/// Load the most recent checkpoint for a run id, or `None` when the
/// directory or a matching file does not exist.
pub async fn load_latest_checkpoint(
    run_id: &str,
    checkpoint_dir: &Path,
) -> Result<Option<PipelineCheckpoint>, AgentFailure> {
    if !checkpoint_dir.exists() {
        return Ok(None);
    }

    let prefix = format!("{run_id}--");
    let mut entries = tokio::fs::read_dir(checkpoint_dir).await.map_err(|e| {
        AgentFailure::checkpoint(format!(
            "Failed to read checkpoint dir {}: {e}",
            checkpoint_dir.display()
        ))
    })?;

    let mut matching: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AgentFailure::checkpoint(format!("Failed to list checkpoints: {e}")))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(&prefix) || !name.ends_with(".json") {
            continue;
        }
        let modified = entry
            .metadata()
            .await
            .and_then(|m| m.modified())
            .map_err(|e| {
                AgentFailure::checkpoint(format!("Failed to stat checkpoint {name}: {e}"))
            })?;
        matching.push((modified, entry.path()));
    }

    matching.sort_by(|a, b| b.0.cmp(&a.0));
    let Some((_, latest_path)) = matching.into_iter().next() else {
        return Ok(None);
    };

    let body = tokio::fs::read(&latest_path).await.map_err(|e| {
        AgentFailure::checkpoint(format!(
            "Failed to load checkpoint {}: {e}",
            latest_path.display()
        ))
    })?;
    let checkpoint: PipelineCheckpoint = serde_json::from_slice(&body).map_err(|e| {
        AgentFailure::checkpoint(format!(
            "Failed to load checkpoint {}: {e}",
            latest_path.display()
        ))
    })?;

    info!(
        path = %latest_path.display(),
        step = %checkpoint.completed_step,
        "checkpoint loaded"
    );
    Ok(Some(checkpoint))
}
