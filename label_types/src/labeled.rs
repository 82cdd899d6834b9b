//! Labeled values.
//!
//! A [`Labeled<L, V>`] binds a value to a type-level label. The value can only
//! be reached through [`Labeled::unsafe_get_value`]; every call to it is a
//! declassification and should be easy to find in review.

use std::fmt;
use std::marker::PhantomData;

use crate::label::{FlowsTo, Label};
use crate::level::Level;

/// An immutable value protected by the label `L`.
///
/// The label is a phantom type and costs nothing at run time. There is no
/// `Deref`, no public field, no serde impl and no comparison; `Debug` prints the
/// label only.
pub struct Labeled<L: Label, V> {
    value: V,
    label: PhantomData<fn() -> L>,
}

impl<L: Label, V> Labeled<L, V> {
    /// Bind `value` under the label `L`
    pub fn new(value: V) -> Self {
        Self {
            value,
            label: PhantomData,
        }
    }

    /// The run-time level of this value's label
    pub fn label(&self) -> Level {
        L::level()
    }

    /// Extract the value, bypassing the label.
    ///
    /// This is the only way to read a labeled value. It performs no flow
    /// check.
    pub fn unsafe_get_value(self) -> V {
        self.value
    }

    /// Relabel the value at a broader label.
    ///
    /// Only compiles when `L` may flow to `L2`:
    ///
    /// ```compile_fail
    /// use label_types::{bits, universe, Labeled, Set};
    ///
    /// universe! { enum Corp { "alice", "bob" } }
    /// type Alice = Set<Corp, bits![1, 0]>;
    /// type Bob = Set<Corp, bits![0, 1]>;
    ///
    /// let secret: Labeled<Alice, u32> = Labeled::new(7);
    /// let leaked: Labeled<Bob, u32> = secret.up_label();
    /// ```
    pub fn up_label<L2: Label>(self) -> Labeled<L2, V>
    where
        L: FlowsTo<L2>,
    {
        Labeled::new(self.value)
    }
}

impl<L: Label, V> Labeled<L, Labeled<L, V>> {
    /// Unbox a value that carries its own label inside.
    pub fn flatten(self) -> Labeled<L, V> {
        self.value
    }
}

impl<L: Label, V: Clone> Clone for Labeled<L, V> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<L: Label, V> fmt::Debug for Labeled<L, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Labeled")
            .field("label", &L::level())
            .field("value", &format_args!("<redacted>"))
            .finish()
    }
}
