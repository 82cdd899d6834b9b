//! Run-time labels
//!
//! The static layer needs every label as a type. When labels come from a
//! policy file they only exist as [`Level`] values, so this module carries the
//! level next to the value and checks flows when an output or a copy is
//! built. The guarantee is weaker: a violation is an `Err` instead of a
//! compile error, but it is still raised before the writer can run.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use label_types::{Bot, Label, Labeled, Level, Top};
use tracing::{debug, warn};

use crate::computation::Lio;
use crate::error::{LioError, Result};

/// A value bound to a run-time level.
pub struct DynLabeled<V> {
    level: Level,
    value: V,
}

impl<V> DynLabeled<V> {
    pub fn new(level: Level, value: V) -> Self {
        Self { level, value }
    }

    pub fn label(&self) -> &Level {
        &self.level
    }

    /// Extract the value, bypassing the label.
    pub fn unsafe_get_value(self) -> V {
        self.value
    }

    /// Relabel at `target`, which must be at least as restrictive.
    pub fn up_label(self, target: Level) -> Result<Self> {
        if !self.level.can_flow_to(&target) {
            return Err(LioError::FlowViolation {
                from: self.level,
                to: target,
            });
        }
        Ok(Self {
            level: target,
            value: self.value,
        })
    }

    /// Move into the static layer under `L`.
    ///
    /// Succeeds when the run-time level flows to `L`, so the static label is
    /// never less restrictive than the one the value carried.
    pub fn into_static<L: Label>(self) -> Result<Labeled<L, V>> {
        let target = L::level();
        if !self.level.can_flow_to(&target) {
            return Err(LioError::FlowViolation {
                from: self.level,
                to: target,
            });
        }
        Ok(Labeled::new(self.value))
    }
}

impl<L: Label, V> From<Labeled<L, V>> for DynLabeled<V> {
    fn from(lv: Labeled<L, V>) -> Self {
        let level = lv.label();
        Self::new(level, lv.unsafe_get_value())
    }
}

impl<V: Clone> Clone for DynLabeled<V> {
    fn clone(&self) -> Self {
        Self {
            level: self.level.clone(),
            value: self.value.clone(),
        }
    }
}

impl<V> fmt::Debug for DynLabeled<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynLabeled")
            .field("label", &self.level)
            .finish_non_exhaustive()
    }
}

type Reader<I> = Arc<dyn Fn() -> anyhow::Result<I> + Send + Sync>;
type Writer<O> = Arc<dyn Fn(O) -> anyhow::Result<()> + Send + Sync>;

/// A read endpoint whose level is known only at run time.
pub struct DynSource<I> {
    level: Level,
    reader: Reader<I>,
}

impl<I> DynSource<I> {
    pub fn new<F>(level: Level, reader: F) -> Self
    where
        F: Fn() -> anyhow::Result<I> + Send + Sync + 'static,
    {
        Self {
            level,
            reader: Arc::new(reader),
        }
    }

    pub fn label(&self) -> &Level {
        &self.level
    }
}

impl<I> Clone for DynSource<I> {
    fn clone(&self) -> Self {
        Self {
            level: self.level.clone(),
            reader: Arc::clone(&self.reader),
        }
    }
}

impl<I> fmt::Debug for DynSource<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynSource")
            .field("label", &self.level)
            .finish_non_exhaustive()
    }
}

/// A write endpoint whose level is known only at run time.
pub struct DynSink<O> {
    level: Level,
    writer: Writer<O>,
}

impl<O> DynSink<O> {
    pub fn new<F>(level: Level, writer: F) -> Self
    where
        F: Fn(O) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            level,
            writer: Arc::new(writer),
        }
    }

    pub fn label(&self) -> &Level {
        &self.level
    }
}

impl<O> Clone for DynSink<O> {
    fn clone(&self) -> Self {
        Self {
            level: self.level.clone(),
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<O> fmt::Debug for DynSink<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynSink")
            .field("label", &self.level)
            .finish_non_exhaustive()
    }
}

pub fn file_source(level: Level, path: impl Into<PathBuf>) -> DynSource<String> {
    let path = path.into();
    DynSource::new(level, move || {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
    })
}

pub fn file_sink(level: Level, path: impl Into<PathBuf>) -> DynSink<String> {
    let path = path.into();
    DynSink::new(level, move |contents: String| {
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    })
}

/// Read from `src`, tagging the result with the source's run-time level.
pub fn input_dyn<I: Send + 'static>(src: &DynSource<I>) -> Lio<Top, Bot, DynLabeled<I>> {
    let reader = Arc::clone(&src.reader);
    let level = src.level.clone();
    Lio::from_thunk(move || {
        debug!(label = %level, "reading from dynamically labeled source");
        match reader() {
            Ok(raw) => Ok(DynLabeled::new(level, raw)),
            Err(source) => Err(LioError::Read {
                label: level,
                source,
            }),
        }
    })
}

fn check_flow(from: &Level, to: &Level) -> Result<()> {
    if from.can_flow_to(to) {
        return Ok(());
    }
    warn!(
        data = %from,
        sink = %to,
        "rejected flow to dynamically labeled sink"
    );
    Err(LioError::FlowViolation {
        from: from.clone(),
        to: to.clone(),
    })
}

fn deferred_write<O>(snk: &DynSink<O>, data: DynLabeled<O>) -> Lio<Bot, Bot, ()>
where
    O: Send + 'static,
{
    let writer = Arc::clone(&snk.writer);
    let sink_level = snk.level.clone();
    Lio::from_thunk(move || {
        debug!(
            data = %data.level,
            sink = %sink_level,
            "writing to dynamically labeled sink"
        );
        writer(data.value).map_err(|source| LioError::Write {
            label: sink_level,
            source,
        })
    })
}

/// Build a write of `data` to `snk` after checking the flow at run time.
///
/// On a violation nothing is deferred and the writer is never called. The
/// returned computation has context `Bot`: the static layer knows nothing
/// about the levels involved, so it may only follow public data.
pub fn output_checked<O: Send + 'static>(
    snk: &DynSink<O>,
    data: DynLabeled<O>,
) -> Result<Lio<Bot, Bot, ()>> {
    check_flow(&data.level, &snk.level)?;
    Ok(deferred_write(snk, data))
}

/// Build a read from `src` followed by a write of the result to `snk`.
///
/// The flow is checked against the endpoint levels before anything is
/// deferred, so a rejected copy never reads its source.
pub fn copy_checked<T: Send + 'static>(
    src: &DynSource<T>,
    snk: &DynSink<T>,
) -> Result<Lio<Bot, Bot, ()>> {
    check_flow(&src.level, &snk.level)?;
    let snk = snk.clone();
    Ok(input_dyn(src).bind(move |data| deferred_write(&snk, data)))
}
