//! # scalarbridge
//!
//! A C ABI contract for passing scalar values and opaque pointers between
//! separately compiled modules, together with the loader that finds the
//! shared library at runtime.
//!
//! The crate builds as a `cdylib` exporting one `sb_pass_*` function per
//! scalar kind (see [`abi::ScalarKind`]) and as an `rlib` providing the
//! caller side: [`Loader`] resolves the library from an explicit
//! [`LoaderConfig`], [`Contract`] binds its exports and [`Scenario`] drives
//! the example call sequence.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scalarbridge::{Contract, Loader, LoaderConfig, Scenario};
//!
//! let config = LoaderConfig::default().add_search_path("target/debug");
//! let library = Loader::new(config).load()?;
//! let contract = Contract::bind(&library)?;
//!
//! let report = Scenario::example().run(&contract)?;
//! assert_eq!(report.calls().len(), 9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ```
//! use scalarbridge::Contract;
//!
//! // The same exports, linked into this process.
//! let contract = Contract::linked();
//! contract.pass_long(-1000).unwrap();
//! ```

pub mod abi;
pub mod block;
pub mod config;
pub mod contract;
pub mod error;
pub mod exports;
pub mod journal;
pub mod launch;
pub mod loader;
pub mod scenario;

pub use block::OpaqueBlock;
pub use config::LoaderConfig;
pub use contract::Contract;
pub use launch::Launch;
pub use loader::{LoadedLibrary, Loader};
pub use scenario::{Scenario, ScenarioReport};
