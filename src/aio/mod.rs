//! Asynchronous labeled computations
//!
//! The same composition engine as [`crate::computation`], with the deferred
//! action being a boxed future instead of a thunk. A computation does nothing
//! until [`AsyncLio::unsafe_run`] is awaited; it suspends at I/O boundaries
//! and never blocks a thread.
//!
//! Beyond the core primitives this module adds [`sequence`], and
//! [`io`](self::io) adds concurrent fan-out ([`io::input_all`]) and conditional
//! writes ([`io::output_when`]).
//!
//! As in the sync layer, a continuation whose context cannot receive the
//! data of its predecessor does not compile:
//!
//! ```compile_fail
//! use label_types::{bits, universe, Labeled, Set};
//! use lio::aio::unlabel;
//!
//! universe! { enum Corp { "alice", "bob" } }
//! type Alice = Set<Corp, bits![1, 0]>;
//! type Bob = Set<Corp, bits![0, 1]>;
//!
//! let secret: Labeled<Alice, u32> = Labeled::new(7);
//! let step = unlabel(secret).raise::<Alice>();
//! let _ = step.bind(|_lv| unlabel(Labeled::<Bob, u32>::new(0)));
//! ```

pub mod fs;
pub mod io;

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use futures::future::BoxFuture;
use futures::FutureExt;
use label_types::{Bot, FlowsTo, Join, JoinWith, Label, Labeled, Meet, MeetWith, Top};
use tracing::{debug_span, trace, Instrument};

use crate::error::Result;

/// A deferred asynchronous computation under context `Pc` with data label `L`.
#[must_use = "a labeled computation does nothing until it is run"]
pub struct AsyncLio<Pc: Label, L: Label, V> {
    future: BoxFuture<'static, Result<V>>,
    labels: PhantomData<fn() -> (Pc, L)>,
}

/// Lift a bare value; see [`crate::ret`].
pub fn ret<V: Send + 'static>(value: V) -> AsyncLio<Top, Bot, V> {
    AsyncLio::from_future(async move { Ok(value) })
}

/// Raise the context to the value's label; see [`crate::unlabel`].
pub fn unlabel<L: Label, V: Send + 'static>(
    lv: Labeled<L, V>,
) -> AsyncLio<L, Bot, Labeled<L, V>> {
    AsyncLio::from_future(async move { Ok(lv) })
}

/// Run `steps` one after another, never overlapping, collecting results in order.
///
/// The first failure ends the sequence; later steps never start.
pub fn sequence<Pc, L, V>(steps: Vec<AsyncLio<Pc, L, V>>) -> AsyncLio<Pc, L, Vec<V>>
where
    Pc: Label,
    L: Label,
    V: Send + 'static,
{
    AsyncLio::from_future(async move {
        let mut results = Vec::with_capacity(steps.len());
        for (index, step) in steps.into_iter().enumerate() {
            trace!(index, "running sequenced step");
            results.push(step.future.await?);
        }
        Ok(results)
    })
}

impl<Pc: Label, L: Label, V: Send + 'static> AsyncLio<Pc, L, V> {
    pub(crate) fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        Self {
            future: future.boxed(),
            labels: PhantomData,
        }
    }

    /// Sequential composition; see [`crate::Lio::bind`].
    ///
    /// The continuation is not invoked before `self` settles.
    pub fn bind<Rpc, R, W, F>(self, f: F) -> AsyncLio<Meet<Pc, Rpc>, Join<L, R>, W>
    where
        Rpc: Label,
        R: Label,
        W: Send + 'static,
        L: FlowsTo<Rpc> + JoinWith<R>,
        Pc: MeetWith<Rpc>,
        F: FnOnce(V) -> AsyncLio<Rpc, R, W> + Send + 'static,
    {
        trace!(
            data = %L::level(),
            context = %Rpc::level(),
            "composing async labeled computation"
        );
        let first = self.future;
        AsyncLio::from_future(async move {
            let value = first.await?;
            f(value).future.await
        })
    }

    pub fn raise<L2>(self) -> AsyncLio<Pc, L2, V>
    where
        L2: Label,
        L: FlowsTo<L2>,
    {
        AsyncLio::from_future(self.future)
    }

    pub fn lower_pc<P2>(self) -> AsyncLio<P2, L, V>
    where
        P2: Label + FlowsTo<Pc>,
    {
        AsyncLio::from_future(self.future)
    }

    /// Drive the computation to settlement and return the bare result.
    ///
    /// Like [`crate::Lio::unsafe_run`], this ends label protection.
    pub async fn unsafe_run(self) -> Result<V> {
        let span = debug_span!("lio.run_async", context = %Pc::level(), data = %L::level());
        self.future.instrument(span).await
    }
}

impl<Pc: Label, L: Label, V: Send + 'static> AsyncLio<Pc, L, Labeled<L, V>> {
    pub fn to_labeled(self) -> AsyncLio<Pc, Bot, Labeled<L, Labeled<L, V>>> {
        let inner = self.future;
        AsyncLio::from_future(async move { inner.await.map(Labeled::new) })
    }
}

impl<Pc: Label, L: Label, V> fmt::Debug for AsyncLio<Pc, L, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLio")
            .field("context", &Pc::level())
            .field("data", &L::level())
            .finish_non_exhaustive()
    }
}
