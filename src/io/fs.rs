//! File-backed endpoints
//!
//! The path is captured when the endpoint is built; the file is touched only
//! when a computation using the endpoint runs.

use std::path::PathBuf;

use anyhow::Context;
use label_types::Label;

use super::{Sink, Source};

/// A source reading the whole file as UTF-8 on every `input`
pub fn file_source<L: Label>(path: impl Into<PathBuf>) -> Source<L, String> {
    let path = path.into();
    Source::new(move || {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
    })
}

/// A sink replacing the file's contents on every `output`
pub fn file_sink<L: Label>(path: impl Into<PathBuf>) -> Sink<L, String> {
    let path = path.into();
    Sink::new(move |contents: String| {
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    })
}

/// A sink appending each value as a line
pub fn append_sink<L: Label>(path: impl Into<PathBuf>) -> Sink<L, String> {
    use std::io::Write;

    let path = path.into();
    Sink::new(move |line: String| {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append to {}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{input, output};
    use label_types::{bits, universe, Labeled, Set};

    universe! { enum Corp { "alice", "bob" } }

    type Alice = Set<Corp, bits![1, 0]>;
    type Team = Set<Corp, bits![1, 1]>;

    #[test]
    fn file_round_trip_through_labels() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("in.txt");
        let dst_path = dir.path().join("out.txt");
        std::fs::write(&src_path, "quarterly numbers").unwrap();

        let src = file_source::<Alice>(&src_path);
        let dst = file_sink::<Team>(&dst_path);
        input(&src)
            .bind(move |lv| output(&dst, lv))
            .unsafe_run()
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&dst_path).unwrap(),
            "quarterly numbers"
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = file_source::<Alice>(dir.path().join("absent.txt"));
        let err = input(&src).unsafe_run().unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn append_sink_accumulates_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let sink = append_sink::<Team>(&path);
        for line in ["one", "two"] {
            output(&sink, Labeled::<Alice, String>::new(line.to_string()))
                .unsafe_run()
                .unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
