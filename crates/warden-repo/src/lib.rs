//! # warden-repo
//!
//! The contract repository for the WARDEN control layer.
//!
//! ## Overview
//!
//! Contracts are TOML documents, one per guarded tool, discovered by
//! scanning a configuration directory at startup. Loading is fail-closed:
//! every document must validate and every trigger condition must compile, or
//! the whole load aborts with an error naming the offending file and field.
//! File names carry no meaning — the `tool_name` inside each document is
//! authoritative.
//!
//! After load the repository is immutable; `lookup` is pure and needs no
//! locking. [`SharedRepository`] adds an explicit, atomic `reload` for
//! configuration changes: in-flight evaluations keep the snapshot they
//! started with.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use warden_repo::ContractRepository;
//!
//! let repo = ContractRepository::load(Path::new(".warden"))?;
//! if let Some(contract) = repo.lookup("search") {
//!     // hand the compiled contract to the aggregator
//! }
//! ```

pub mod repository;
pub mod shared;

pub use repository::{CompiledContract, CompiledRule, ContractRepository};
pub use shared::SharedRepository;
