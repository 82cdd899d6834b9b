//! Flow witnesses.

use std::fmt;
use std::marker::PhantomData;

use crate::label::{FlowsTo, Label};

/// A value witnessing that data labeled `A` may flow to `B`.
///
/// Useful where the two labels are far apart in the code: the proof is built
/// where the relation is evident and carried to the write site.
pub struct FlowProof<A: Label, B: Label>(PhantomData<fn() -> (A, B)>);

impl<A: Label, B: Label> FlowProof<A, B> {
    pub fn new() -> Self
    where
        A: FlowsTo<B>,
    {
        FlowProof(PhantomData)
    }

    /// Chain `A ⊑ B` and `B ⊑ C` into `A ⊑ C`
    pub fn then<C: Label>(self, _next: FlowProof<B, C>) -> FlowProof<A, C> {
        FlowProof(PhantomData)
    }
}

impl<A: Label> FlowProof<A, A> {
    pub fn reflexive() -> Self {
        FlowProof(PhantomData)
    }
}

impl<A: Label, B: Label> Clone for FlowProof<A, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: Label, B: Label> Copy for FlowProof<A, B> {}

impl<A: FlowsTo<B>, B: Label> Default for FlowProof<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Label, B: Label> fmt::Debug for FlowProof<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowProof({} -> {})", A::level(), B::level())
    }
}
