//! LIO - Labeled I/O
//!
//! Values carry security labels drawn from a lattice of principals, and
//! effectful work on them is composed so that confidential data never reaches
//! a destination that may not observe it.
//!
//! ## Architecture
//! Every effect flows through one pipeline:
//! Source (attaches label) -> bind chain (raises labels) -> Sink (flow check)
//!
//! Labels are types, so an illegal flow in the static layer is a compile
//! error. Labels that only exist at run time go through [`dynamic`], which
//! checks the same relation and fails with [`LioError::FlowViolation`].
//!
//! ## Quick Start
//!
//! ```rust
//! use label_types::{bits, universe, Set};
//! use lio::io::{input, output, Sink, Source};
//!
//! universe! { pub enum Corp { "alice", "bob" } }
//! type Alice = Set<Corp, bits![1, 0]>;
//! type Team = Set<Corp, bits![1, 1]>;
//!
//! let ledger: Source<Alice, u32> = Source::new(|| Ok(42));
//! let board: Sink<Team, u32> = Sink::new(|v| {
//!     println!("board sees {v}");
//!     Ok(())
//! });
//!
//! input(&ledger)
//!     .bind(move |lv| output(&board, lv))
//!     .unsafe_run()
//!     .unwrap();
//! ```

// Core error handling
pub mod error;

// Synchronous computations and I/O
pub mod computation;
pub mod io;

// Async computations and I/O
pub mod aio;

// Run-time labels and the policy file that names them
pub mod config;
pub mod dynamic;

pub use computation::{ret, unlabel, Lio};
pub use config::{ChannelConfig, LatticeConfig, LevelSpec};
pub use dynamic::{copy_checked, input_dyn, output_checked, DynLabeled, DynSink, DynSource};
pub use error::{ConfigError, LioError, Result};

// Lattice types, re-exported so most users need a single dependency
pub use label_types::{
    bits, universe, Bot, FlowProof, FlowsTo, Join, JoinWith, Label, Labeled, Level, Meet,
    MeetWith, Principal, Set, Top,
};
