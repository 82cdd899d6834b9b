//! Labeled I/O boundary
//!
//! Sources attach a label to what they read; sinks check the flow relation
//! before anything is written. The check is a trait bound, so an explicit flow
//! to a sink that may not observe the data is rejected by the compiler:
//!
//! ```compile_fail
//! use label_types::{bits, universe, Labeled, Set};
//! use lio::io::{output, Sink};
//!
//! universe! { enum Corp { "alice", "bob" } }
//! type Alice = Set<Corp, bits![1, 0]>;
//! type Bob = Set<Corp, bits![0, 1]>;
//!
//! let bob_inbox: Sink<Bob, u32> = Sink::new(|_v| Ok(()));
//! let secret: Labeled<Alice, u32> = Labeled::new(42);
//! let _ = output(&bob_inbox, secret);
//! ```

pub mod fs;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use label_types::{Bot, FlowProof, FlowsTo, Label, Labeled, Level, Top};
use tracing::debug;

use crate::computation::Lio;
use crate::error::LioError;

type Reader<I> = Arc<dyn Fn() -> anyhow::Result<I> + Send + Sync>;
type Writer<O> = Arc<dyn Fn(O) -> anyhow::Result<()> + Send + Sync>;

/// A labeled read endpoint.
///
/// Cloning shares the underlying reader.
pub struct Source<L: Label, I> {
    reader: Reader<I>,
    label: PhantomData<fn() -> L>,
}

impl<L: Label, I> Source<L, I> {
    pub fn new<F>(reader: F) -> Self
    where
        F: Fn() -> anyhow::Result<I> + Send + Sync + 'static,
    {
        Self {
            reader: Arc::new(reader),
            label: PhantomData,
        }
    }

    pub fn label(&self) -> Level {
        L::level()
    }
}

impl<L: Label, I> Clone for Source<L, I> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            label: PhantomData,
        }
    }
}

impl<L: Label, I> fmt::Debug for Source<L, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("label", &L::level())
            .finish_non_exhaustive()
    }
}

/// A labeled write endpoint.
pub struct Sink<L: Label, O> {
    writer: Writer<O>,
    label: PhantomData<fn() -> L>,
}

impl<L: Label, O> Sink<L, O> {
    pub fn new<F>(writer: F) -> Self
    where
        F: Fn(O) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            writer: Arc::new(writer),
            label: PhantomData,
        }
    }

    pub fn label(&self) -> Level {
        L::level()
    }
}

impl<L: Label, O> Clone for Sink<L, O> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            label: PhantomData,
        }
    }
}

impl<L: Label, O> fmt::Debug for Sink<L, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("label", &L::level())
            .finish_non_exhaustive()
    }
}

/// Read from `src` and label the result at the source's level.
///
/// Reading carries no implicit-flow risk, so the context stays `Top`; the
/// value read is tagged `L` from here on.
pub fn input<L, I>(src: &Source<L, I>) -> Lio<Top, Bot, Labeled<L, I>>
where
    L: Label,
    I: Send + 'static,
{
    let reader = Arc::clone(&src.reader);
    Lio::from_thunk(move || {
        debug!(label = %L::level(), "reading from labeled source");
        let raw = reader().map_err(|source| LioError::Read {
            label: L::level(),
            source,
        })?;
        Ok(Labeled::new(raw))
    })
}

/// Write `data` to `snk`. Compiles only when `Ld` may flow to `Ls`.
///
/// A chain that combines two `{alice}` reads cannot end at a `{bob}` sink:
///
/// ```compile_fail
/// use label_types::{bits, universe, Labeled, Set};
/// use lio::io::{input, output, Sink, Source};
///
/// universe! { enum Corp { "alice", "bob" } }
/// type Alice = Set<Corp, bits![1, 0]>;
/// type Bob = Set<Corp, bits![0, 1]>;
///
/// let a: Source<Alice, u32> = Source::new(|| Ok(42));
/// let b: Source<Alice, u32> = Source::new(|| Ok(10));
/// let bob_inbox: Sink<Bob, u32> = Sink::new(|_v| Ok(()));
/// let _ = input(&a).bind(move |x| {
///     input(&b).bind(move |y| {
///         let sum = x.unsafe_get_value() + y.unsafe_get_value();
///         output(&bob_inbox, Labeled::<Alice, u32>::new(sum))
///     })
/// });
/// ```
pub fn output<Ls, Ld, O>(snk: &Sink<Ls, O>, data: Labeled<Ld, O>) -> Lio<Ld, Bot, ()>
where
    Ls: Label,
    Ld: Label + FlowsTo<Ls>,
    O: Send + 'static,
{
    output_with(snk, FlowProof::new(), data)
}

/// [`output`] with the flow relation supplied as a witness.
pub fn output_with<Ls, Ld, O>(
    snk: &Sink<Ls, O>,
    _proof: FlowProof<Ld, Ls>,
    data: Labeled<Ld, O>,
) -> Lio<Ld, Bot, ()>
where
    Ls: Label,
    Ld: Label,
    O: Send + 'static,
{
    let writer = Arc::clone(&snk.writer);
    Lio::from_thunk(move || {
        debug!(
            data = %Ld::level(),
            sink = %Ls::level(),
            "writing to labeled sink"
        );
        writer(data.unsafe_get_value()).map_err(|source| LioError::Write {
            label: Ls::level(),
            source,
        })
    })
}
