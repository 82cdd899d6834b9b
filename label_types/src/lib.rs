//! Label Types - Level 1 Foundation Types
//!
//! This crate holds the security lattice that every other crate in the
//! workspace builds on. It depends on no other workspace crate.
//!
//! ## Contents
//!
//! - [`Principal`] and the run-time [`Level`] lattice (`can_flow_to`, `join`,
//!   `meet`, `bot`, `top`)
//! - Type-level labels ([`Label`], [`Bot`], [`Top`], [`Set`]) with the flow
//!   relation and lattice operators as traits ([`FlowsTo`], [`JoinWith`],
//!   [`MeetWith`]), so illegal flows fail to compile
//! - [`Labeled`], the opaque labeled value
//! - [`FlowProof`], a witness of a flow relation
//!
//! ## Rules
//!
//! 1. **NO EFFECTS** - computations and I/O live in the `lio` crate
//! 2. **NO VALUE ACCESS** - `Labeled` exposes its value only through
//!    `unsafe_get_value`
//! 3. **NO WORKSPACE DEPENDENCIES**

mod error;
mod label;
mod labeled;
mod level;
mod principal;
mod proof;

pub use error::LevelParseError;
pub use label::{
    Bit, BitAnd, BitLe, BitOr, Bits, BitsAnd, BitsLe, BitsOr, Bot, Cons, FlowsTo, In, Join,
    JoinWith, Label, Meet, MeetWith, Nil, NoneSet, Out, Set, Top, Universe,
};
pub use labeled::Labeled;
pub use level::Level;
pub use principal::Principal;
pub use proof::FlowProof;
