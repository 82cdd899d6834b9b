//! File-backed asynchronous endpoints on `tokio::fs`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use label_types::Label;
use tokio::io::AsyncWriteExt;

use super::io::{AsyncSink, AsyncSource};

pub fn file_source<L: Label>(path: impl Into<PathBuf>) -> AsyncSource<L, String> {
    let path = Arc::new(path.into());
    AsyncSource::new(move || {
        let path = Arc::clone(&path);
        async move {
            tokio::fs::read_to_string(path.as_path())
                .await
                .with_context(|| format!("Failed to read {}", path.display()))
        }
    })
}

pub fn file_sink<L: Label>(path: impl Into<PathBuf>) -> AsyncSink<L, String> {
    let path = Arc::new(path.into());
    AsyncSink::new(move |contents: String| {
        let path = Arc::clone(&path);
        async move {
            tokio::fs::write(path.as_path(), contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))
        }
    })
}

/// Appends each value as a line, creating the file on first write.
pub fn append_sink<L: Label>(path: impl Into<PathBuf>) -> AsyncSink<L, String> {
    let path = Arc::new(path.into());
    AsyncSink::new(move |line: String| {
        let path = Arc::clone(&path);
        async move {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path.as_path())
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.write_all(format!("{line}\n").as_bytes())
                .await
                .with_context(|| format!("Failed to append to {}", path.display()))?;
            file.flush()
                .await
                .with_context(|| format!("Failed to flush {}", path.display()))
        }
    })
}
