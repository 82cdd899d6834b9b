//! Labeled computations and the composition engine
//!
//! A [`Lio<Pc, L, V>`] is a deferred, single-shot unit of work producing a `V`.
//! `Pc` is the control-context label (a lower bound on where the work's effects
//! may be observed) and `L` the data label of its result. Both labels are
//! phantom: at run time a `Lio` is nothing but a boxed thunk. The labels only
//! constrain how computations compose:
//!
//! - [`ret`] lifts a value as `Lio<Top, Bot, V>`.
//! - [`unlabel`] raises the control context to the value's label.
//! - [`Lio::bind`] requires `L: FlowsTo<Rpc>` and yields
//!   `Lio<Meet<Pc, Rpc>, Join<L, R>, W>`.
//! - [`Lio::to_labeled`] moves the data label inside the result.
//! - [`Lio::unsafe_run`] executes the thunk and drops the labels. Call it once,
//!   from the program's trusted driver.
//!
//! A continuation whose context cannot receive the data of its predecessor
//! does not compile:
//!
//! ```compile_fail
//! use label_types::{bits, universe, Labeled, Set};
//! use lio::unlabel;
//!
//! universe! { enum Corp { "alice", "bob" } }
//! type Alice = Set<Corp, bits![1, 0]>;
//! type Bob = Set<Corp, bits![0, 1]>;
//!
//! let secret: Labeled<Alice, u32> = Labeled::new(7);
//! let step = unlabel(secret).raise::<Alice>();
//! // data labeled {alice} cannot reach a {bob} context
//! let _ = step.bind(|_lv| unlabel(Labeled::<Bob, u32>::new(0)));
//! ```

use std::fmt;
use std::marker::PhantomData;

use label_types::{Bot, FlowsTo, Join, JoinWith, Label, Labeled, Meet, MeetWith, Top};
use tracing::{debug_span, trace};

use crate::error::Result;

type Thunk<V> = Box<dyn FnOnce() -> Result<V> + Send + 'static>;

/// A deferred computation under control context `Pc` with data label `L`.
#[must_use = "a labeled computation does nothing until it is run"]
pub struct Lio<Pc: Label, L: Label, V> {
    thunk: Thunk<V>,
    labels: PhantomData<fn() -> (Pc, L)>,
}

/// Lift a bare value with the weakest guarantee: unrestricted context, public data.
pub fn ret<V: Send + 'static>(value: V) -> Lio<Top, Bot, V> {
    Lio::from_thunk(move || Ok(value))
}

/// Turn a labeled value into a computation whose context is the value's label.
///
/// Anything bound after this runs in a context at least as confined as `L`,
/// which blocks implicit flows through branching on the value. The result is
/// still the labeled value.
pub fn unlabel<L: Label, V: Send + 'static>(lv: Labeled<L, V>) -> Lio<L, Bot, Labeled<L, V>> {
    Lio::from_thunk(move || Ok(lv))
}

impl<Pc: Label, L: Label, V: 'static> Lio<Pc, L, V> {
    pub(crate) fn from_thunk<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<V> + Send + 'static,
    {
        Self {
            thunk: Box::new(f),
            labels: PhantomData,
        }
    }

    /// Sequential composition.
    ///
    /// Runs `self` to completion, hands its result to `f`, then runs the
    /// computation `f` returns. A failure in either step ends the chain.
    pub fn bind<Rpc, R, W, F>(self, f: F) -> Lio<Meet<Pc, Rpc>, Join<L, R>, W>
    where
        Rpc: Label,
        R: Label,
        W: 'static,
        L: FlowsTo<Rpc> + JoinWith<R>,
        Pc: MeetWith<Rpc>,
        F: FnOnce(V) -> Lio<Rpc, R, W> + Send + 'static,
    {
        trace!(
            data = %L::level(),
            context = %Rpc::level(),
            "composing labeled computation"
        );
        let first = self.thunk;
        Lio::from_thunk(move || {
            let value = first()?;
            (f(value).thunk)()
        })
    }

    /// Claim a broader data label.
    pub fn raise<L2>(self) -> Lio<Pc, L2, V>
    where
        L2: Label,
        L: FlowsTo<L2>,
    {
        Lio::from_thunk(self.thunk)
    }

    /// Claim a narrower control context.
    pub fn lower_pc<P2>(self) -> Lio<P2, L, V>
    where
        P2: Label + FlowsTo<Pc>,
    {
        Lio::from_thunk(self.thunk)
    }

    /// Execute the computation and return the bare result, discarding both labels.
    ///
    /// This is where label protection ends. Reserve it for the program's
    /// outermost driver.
    pub fn unsafe_run(self) -> Result<V> {
        let span = debug_span!("lio.run", context = %Pc::level(), data = %L::level());
        let _enter = span.enter();
        (self.thunk)()
    }
}

impl<Pc: Label, L: Label, V: Send + 'static> Lio<Pc, L, Labeled<L, V>> {
    /// Box the result together with its own label.
    ///
    /// The label now travels inside the value and the computation itself
    /// carries public data. [`Labeled::flatten`] undoes the boxing.
    pub fn to_labeled(self) -> Lio<Pc, Bot, Labeled<L, Labeled<L, V>>> {
        let inner = self.thunk;
        Lio::from_thunk(move || inner().map(Labeled::new))
    }
}

impl<Pc: Label, L: Label, V> fmt::Debug for Lio<Pc, L, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lio")
            .field("context", &Pc::level())
            .field("data", &L::level())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LioError;
    use label_types::{bits, universe, Level, Set};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    universe! { enum Corp { "alice", "bob" } }

    type Alice = Set<Corp, bits![1, 0]>;
    type Team = Set<Corp, bits![1, 1]>;

    #[test]
    fn ret_runs_to_its_value() {
        assert_eq!(ret(5).unsafe_run().unwrap(), 5);
    }

    #[test]
    fn unlabel_keeps_the_value_labeled() {
        let lv: Labeled<Alice, &str> = Labeled::new("x");
        let out = unlabel(lv).unsafe_run().unwrap();
        assert_eq!(out.label(), Level::singleton("alice"));
        assert_eq!(out.unsafe_get_value(), "x");
    }

    #[test]
    fn nothing_runs_before_unsafe_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let m = ret(1).bind(move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            ret(v + 1)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(m.unsafe_run().unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bind_runs_steps_left_to_right() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let m = Lio::<Top, Bot, u8>::from_thunk(move || {
            l1.lock().unwrap().push("first");
            Ok(1)
        })
        .bind(move |a| {
            l2.lock().unwrap().push("second");
            ret(a + 1)
        })
        .bind(move |b| {
            l3.lock().unwrap().push("third");
            ret(b * 10)
        });
        assert_eq!(m.unsafe_run().unwrap(), 20);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn bind_meets_contexts_and_joins_data() {
        let lv: Labeled<Alice, u8> = Labeled::new(3);
        let m = ret(()).bind(move |_| unlabel(lv));
        let m: Lio<Alice, Bot, Labeled<Alice, u8>> = m;
        assert_eq!(
            format!("{:?}", m),
            "Lio { context: Principals({Principal(\"alice\")}), data: Principals({}), .. }"
        );

        let raised: Lio<Alice, Team, _> = m.raise::<Team>();
        let out = raised
            .bind(|lv: Labeled<Alice, u8>| unlabel(lv.up_label::<Team>()))
            .unsafe_run()
            .unwrap();
        assert_eq!(out.unsafe_get_value(), 3);
    }

    #[test]
    fn failure_stops_the_chain() {
        let reached = Arc::new(AtomicUsize::new(0));
        let flag = reached.clone();
        let m = Lio::<Top, Bot, u8>::from_thunk(|| {
            Err(LioError::Read {
                label: Level::bot(),
                source: anyhow::anyhow!("gone"),
            })
        })
        .bind(move |v| {
            flag.fetch_add(1, Ordering::SeqCst);
            ret(v)
        });
        let err = m.unsafe_run().unwrap_err();
        assert!(matches!(err, LioError::Read { .. }));
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn to_labeled_then_flatten_recovers_label_and_value() {
        let lv: Labeled<Alice, String> = Labeled::new("payload".to_string());
        let boxed = unlabel(lv).raise::<Alice>().to_labeled().unsafe_run().unwrap();
        let inner = boxed.flatten();
        assert_eq!(inner.label(), Level::singleton("alice"));
        assert_eq!(inner.unsafe_get_value(), "payload");
    }

    #[test]
    fn labeled_data_binds_into_a_context_at_its_label() {
        let secret: Labeled<Alice, u32> = Labeled::new(7);
        let m: Lio<Alice, Alice, Labeled<Alice, u32>> = unlabel(secret)
            .raise::<Alice>()
            .bind(|lv| unlabel(Labeled::<Alice, u32>::new(lv.unsafe_get_value() + 1)));
        assert_eq!(m.unsafe_run().unwrap().unsafe_get_value(), 8);
    }

    #[test]
    fn lower_pc_accepts_narrower_contexts() {
        let m: Lio<Alice, Bot, u8> = ret(9).lower_pc::<Alice>();
        assert_eq!(m.unsafe_run().unwrap(), 9);
    }
}
