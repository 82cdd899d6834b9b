//! Type-level labels.
//!
//! Labels are zero-sized marker types. The flow relation and the lattice
//! operators are traits, so an illegal flow is a missing impl and the compiler
//! rejects it:
//!
//! - [`FlowsTo<B>`] is implemented for `A` exactly when `A ⊆ B`.
//! - [`JoinWith<B>`] / [`MeetWith<B>`] compute union and intersection; use the
//!   [`Join`] and [`Meet`] aliases.
//!
//! Besides the global [`Bot`] and [`Top`], labels over concrete principals are
//! `Set<U, B>`: `U` is a [`Universe`] (an ordered list of principal names) and
//! `B` a bit list built with [`bits!`](crate::bits) saying which of them are in
//! the set.
//!
//! ```
//! use label_types::{bits, universe, FlowsTo, Join, Label, Level, Set};
//!
//! universe! { pub enum Corp { "alice", "bob" } }
//!
//! type Alice = Set<Corp, bits![1, 0]>;
//! type Bob = Set<Corp, bits![0, 1]>;
//! type Team = Join<Alice, Bob>;
//!
//! fn flows<A: FlowsTo<B>, B: Label>() {}
//! flows::<Alice, Team>();
//!
//! assert_eq!(Team::level(), Level::from_principals(["alice", "bob"]));
//! ```

use std::marker::PhantomData;

use crate::level::Level;

/// A security label known to the type system.
pub trait Label: 'static {
    /// The run-time level this label denotes
    fn level() -> Level;
}

/// An ordered list of principal names backing [`Set`] labels.
///
/// Declare one with [`universe!`](crate::universe).
pub trait Universe: 'static {
    const PRINCIPALS: &'static [&'static str];
}

/// The public label: the empty principal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bot {}

/// The universal label: every principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Top {}

/// The label holding the principals of `U` whose bit in `B` is set.
pub struct Set<U, B>(PhantomData<fn() -> (U, B)>);

impl Label for Bot {
    fn level() -> Level {
        Level::bot()
    }
}

impl Label for Top {
    fn level() -> Level {
        Level::top()
    }
}

impl<U: Universe, B: Bits> Label for Set<U, B> {
    fn level() -> Level {
        debug_assert_eq!(
            B::LEN,
            U::PRINCIPALS.len(),
            "bit list width must match the universe"
        );
        let mut members = Vec::with_capacity(B::LEN);
        B::collect_set(0, &mut members);
        Level::from_principals(
            members
                .into_iter()
                .filter_map(|i| U::PRINCIPALS.get(i).copied()),
        )
    }
}

// ============================================================================
// BIT LISTS
// ============================================================================

/// Principal present.
pub enum In {}

/// Principal absent.
pub enum Out {}

/// End of a bit list.
pub enum Nil {}

/// A bit `H` followed by the rest of the list `T`.
pub struct Cons<H, T>(PhantomData<fn() -> (H, T)>);

pub trait Bit: 'static {
    const SET: bool;
}

impl Bit for In {
    const SET: bool = true;
}

impl Bit for Out {
    const SET: bool = false;
}

pub trait BitLe<B: Bit>: Bit {}

impl BitLe<Out> for Out {}
impl BitLe<In> for Out {}
impl BitLe<In> for In {}

pub trait BitOr<B: Bit>: Bit {
    type Output: Bit;
}

impl<B: Bit> BitOr<B> for Out {
    type Output = B;
}

impl<B: Bit> BitOr<B> for In {
    type Output = In;
}

pub trait BitAnd<B: Bit>: Bit {
    type Output: Bit;
}

impl<B: Bit> BitAnd<B> for Out {
    type Output = Out;
}

impl<B: Bit> BitAnd<B> for In {
    type Output = B;
}

/// A fixed-width list of [`Bit`]s.
pub trait Bits: 'static {
    const LEN: usize;

    /// Push the indices of set bits, starting at `offset`
    fn collect_set(offset: usize, out: &mut Vec<usize>);
}

impl Bits for Nil {
    const LEN: usize = 0;

    fn collect_set(_offset: usize, _out: &mut Vec<usize>) {}
}

impl<H: Bit, T: Bits> Bits for Cons<H, T> {
    const LEN: usize = 1 + T::LEN;

    fn collect_set(offset: usize, out: &mut Vec<usize>) {
        if H::SET {
            out.push(offset);
        }
        T::collect_set(offset + 1, out);
    }
}

/// Pointwise `≤`; only lists of equal width are comparable.
pub trait BitsLe<B: Bits>: Bits {}

impl BitsLe<Nil> for Nil {}

impl<H1, T1, H2, T2> BitsLe<Cons<H2, T2>> for Cons<H1, T1>
where
    H1: BitLe<H2>,
    H2: Bit,
    T1: BitsLe<T2>,
    T2: Bits,
{
}

pub trait BitsOr<B: Bits>: Bits {
    type Output: Bits;
}

impl BitsOr<Nil> for Nil {
    type Output = Nil;
}

impl<H1, T1, H2, T2> BitsOr<Cons<H2, T2>> for Cons<H1, T1>
where
    H1: BitOr<H2>,
    H2: Bit,
    T1: BitsOr<T2>,
    T2: Bits,
{
    type Output = Cons<<H1 as BitOr<H2>>::Output, <T1 as BitsOr<T2>>::Output>;
}

pub trait BitsAnd<B: Bits>: Bits {
    type Output: Bits;
}

impl BitsAnd<Nil> for Nil {
    type Output = Nil;
}

impl<H1, T1, H2, T2> BitsAnd<Cons<H2, T2>> for Cons<H1, T1>
where
    H1: BitAnd<H2>,
    H2: Bit,
    T1: BitsAnd<T2>,
    T2: Bits,
{
    type Output = Cons<<H1 as BitAnd<H2>>::Output, <T1 as BitsAnd<T2>>::Output>;
}

/// A list with no bit set.
pub trait NoneSet: Bits {}

impl NoneSet for Nil {}
impl<T: NoneSet> NoneSet for Cons<Out, T> {}

// ============================================================================
// FLOW RELATION AND LATTICE OPERATORS
// ============================================================================

/// Implemented when data labeled `Self` may flow to a channel labeled `Target`.
pub trait FlowsTo<Target: Label>: Label {}

impl<T: Label> FlowsTo<T> for Bot {}

impl FlowsTo<Top> for Top {}

impl<U: Universe, B: Bits> FlowsTo<Top> for Set<U, B> {}

impl<U: Universe, B: NoneSet> FlowsTo<Bot> for Set<U, B> {}

impl<U, A, B> FlowsTo<Set<U, B>> for Set<U, A>
where
    U: Universe,
    A: BitsLe<B>,
    B: Bits,
{
}

/// Least upper bound at the type level.
pub trait JoinWith<Other: Label>: Label {
    type Output: Label;
}

impl<X: Label> JoinWith<X> for Bot {
    type Output = X;
}

impl<X: Label> JoinWith<X> for Top {
    type Output = Top;
}

impl<U: Universe, A: Bits> JoinWith<Bot> for Set<U, A> {
    type Output = Set<U, A>;
}

impl<U: Universe, A: Bits> JoinWith<Top> for Set<U, A> {
    type Output = Top;
}

impl<U, A, B> JoinWith<Set<U, B>> for Set<U, A>
where
    U: Universe,
    A: BitsOr<B>,
    B: Bits,
{
    type Output = Set<U, <A as BitsOr<B>>::Output>;
}

/// Greatest lower bound at the type level.
pub trait MeetWith<Other: Label>: Label {
    type Output: Label;
}

impl<X: Label> MeetWith<X> for Bot {
    type Output = Bot;
}

impl<X: Label> MeetWith<X> for Top {
    type Output = X;
}

impl<U: Universe, A: Bits> MeetWith<Bot> for Set<U, A> {
    type Output = Bot;
}

impl<U: Universe, A: Bits> MeetWith<Top> for Set<U, A> {
    type Output = Set<U, A>;
}

impl<U, A, B> MeetWith<Set<U, B>> for Set<U, A>
where
    U: Universe,
    A: BitsAnd<B>,
    B: Bits,
{
    type Output = Set<U, <A as BitsAnd<B>>::Output>;
}

/// `A ⊔ B`
pub type Join<A, B> = <A as JoinWith<B>>::Output;

/// `A ⊓ B`
pub type Meet<A, B> = <A as MeetWith<B>>::Output;

// ============================================================================
// MACROS
// ============================================================================

/// Build a [`Bits`] list from `0`/`1` digits: `bits![1, 0, 1]`.
#[macro_export]
macro_rules! bits {
    () => { $crate::Nil };
    (1 $(, $rest:tt)*) => { $crate::Cons<$crate::In, $crate::bits![$($rest),*]> };
    (0 $(, $rest:tt)*) => { $crate::Cons<$crate::Out, $crate::bits![$($rest),*]> };
}

/// Declare a [`Universe`]: `universe! { pub enum Corp { "alice", "bob" } }`.
///
/// The order of the names fixes the bit positions used by [`bits!`].
#[macro_export]
macro_rules! universe {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($principal:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {}

        impl $crate::Universe for $name {
            const PRINCIPALS: &'static [&'static str] = &[$($principal),*];
        }
    };
}
