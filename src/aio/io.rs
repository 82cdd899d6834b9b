//! Asynchronous labeled I/O boundary
//!
//! Restates [`crate::io`] over futures and adds:
//!
//! - [`input_all`]: read several equally labeled sources concurrently
//! - [`output_when`]: write only if a labeled condition holds
//!
//! A conditional write whose condition could leak through the presence or
//! absence of the write is rejected:
//!
//! ```compile_fail
//! use label_types::{bits, universe, Labeled, Set};
//! use lio::aio::io::{output_when, AsyncSink};
//!
//! universe! { enum Corp { "alice", "bob" } }
//! type Alice = Set<Corp, bits![1, 0]>;
//! type Bob = Set<Corp, bits![0, 1]>;
//!
//! let bob_inbox: AsyncSink<Bob, u32> = AsyncSink::new(|_v| async { Ok(()) });
//! let alice_secret: Labeled<Alice, bool> = Labeled::new(true);
//! let _ = output_when(&bob_inbox, alice_secret, Labeled::<Bob, u32>::new(1));
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use label_types::{Bot, FlowProof, FlowsTo, Join, JoinWith, Label, Labeled, Level, Top};
use tracing::{debug, trace};

use super::AsyncLio;
use crate::error::LioError;

type AsyncReader<I> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<I>> + Send + Sync>;
type AsyncWriter<O> = Arc<dyn Fn(O) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A labeled asynchronous read endpoint.
pub struct AsyncSource<L: Label, I> {
    reader: AsyncReader<I>,
    label: PhantomData<fn() -> L>,
}

impl<L: Label, I: Send + 'static> AsyncSource<L, I> {
    pub fn new<F, Fut>(reader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<I>> + Send + 'static,
    {
        Self {
            reader: Arc::new(move || reader().boxed()),
            label: PhantomData,
        }
    }

    pub fn label(&self) -> Level {
        L::level()
    }
}

impl<L: Label, I> Clone for AsyncSource<L, I> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            label: PhantomData,
        }
    }
}

impl<L: Label, I> fmt::Debug for AsyncSource<L, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSource")
            .field("label", &L::level())
            .finish_non_exhaustive()
    }
}

/// A labeled asynchronous write endpoint.
pub struct AsyncSink<L: Label, O> {
    writer: AsyncWriter<O>,
    label: PhantomData<fn() -> L>,
}

impl<L: Label, O: Send + 'static> AsyncSink<L, O> {
    pub fn new<F, Fut>(writer: F) -> Self
    where
        F: Fn(O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            writer: Arc::new(move |value| writer(value).boxed()),
            label: PhantomData,
        }
    }

    pub fn label(&self) -> Level {
        L::level()
    }
}

impl<L: Label, O> Clone for AsyncSink<L, O> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
            label: PhantomData,
        }
    }
}

impl<L: Label, O> fmt::Debug for AsyncSink<L, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSink")
            .field("label", &L::level())
            .finish_non_exhaustive()
    }
}

fn read_error<L: Label>(source: anyhow::Error) -> LioError {
    LioError::Read {
        label: L::level(),
        source,
    }
}

fn write_error<L: Label>(source: anyhow::Error) -> LioError {
    LioError::Write {
        label: L::level(),
        source,
    }
}

/// Read from `src` and label the result at the source's level.
pub fn input<L, I>(src: &AsyncSource<L, I>) -> AsyncLio<Top, Bot, Labeled<L, I>>
where
    L: Label,
    I: Send + 'static,
{
    let reader = Arc::clone(&src.reader);
    AsyncLio::from_future(async move {
        debug!(label = %L::level(), "reading from labeled source");
        let raw = reader().await.map_err(read_error::<L>)?;
        Ok(Labeled::new(raw))
    })
}

/// Read all `sources` concurrently.
///
/// Completes once every read has settled. Results keep the order of
/// `sources` whatever order the reads finish in. If any read fails the whole
/// computation fails with the first failure in source order; the other reads
/// still run to completion and their results are dropped.
pub fn input_all<L, I>(sources: &[AsyncSource<L, I>]) -> AsyncLio<Top, Bot, Vec<Labeled<L, I>>>
where
    L: Label,
    I: Send + 'static,
{
    let readers: Vec<AsyncReader<I>> = sources.iter().map(|s| Arc::clone(&s.reader)).collect();
    AsyncLio::from_future(async move {
        debug!(
            label = %L::level(),
            count = readers.len(),
            "reading labeled sources concurrently"
        );
        let settled = join_all(readers.iter().map(|reader| reader())).await;
        settled
            .into_iter()
            .map(|result| result.map(Labeled::new).map_err(read_error::<L>))
            .collect()
    })
}

/// Write `data` to `snk`. Compiles only when `Ld` may flow to `Ls`.
pub fn output<Ls, Ld, O>(snk: &AsyncSink<Ls, O>, data: Labeled<Ld, O>) -> AsyncLio<Ld, Bot, ()>
where
    Ls: Label,
    Ld: Label + FlowsTo<Ls>,
    O: Send + 'static,
{
    output_with(snk, FlowProof::new(), data)
}

/// [`output`] with the flow relation supplied as a witness.
pub fn output_with<Ls, Ld, O>(
    snk: &AsyncSink<Ls, O>,
    _proof: FlowProof<Ld, Ls>,
    data: Labeled<Ld, O>,
) -> AsyncLio<Ld, Bot, ()>
where
    Ls: Label,
    Ld: Label,
    O: Send + 'static,
{
    let writer = Arc::clone(&snk.writer);
    AsyncLio::from_future(async move {
        debug!(
            data = %Ld::level(),
            sink = %Ls::level(),
            "writing to labeled sink"
        );
        writer(data.unsafe_get_value())
            .await
            .map_err(write_error::<Ls>)
    })
}

/// Write `data` to `snk` only if `condition` holds.
///
/// Both the condition's label and the data's label must flow to the sink:
/// whether the write happens at all reveals the condition.
pub fn output_when<S, C, D, O>(
    snk: &AsyncSink<S, O>,
    condition: Labeled<C, bool>,
    data: Labeled<D, O>,
) -> AsyncLio<Join<C, D>, Bot, ()>
where
    S: Label,
    C: Label + FlowsTo<S> + JoinWith<D>,
    D: Label + FlowsTo<S>,
    O: Send + 'static,
{
    let writer = Arc::clone(&snk.writer);
    AsyncLio::from_future(async move {
        if !condition.unsafe_get_value() {
            trace!(sink = %S::level(), "condition false, write skipped");
            return Ok(());
        }
        debug!(
            condition = %C::level(),
            data = %D::level(),
            sink = %S::level(),
            "conditional write to labeled sink"
        );
        writer(data.unsafe_get_value())
            .await
            .map_err(write_error::<S>)
    })
}
