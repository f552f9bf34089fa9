//! # cadlink Engine
//!
//! Reconciles cadlink snapshots with a live drawing document.
//!
//! This crate provides:
//! - The host capability surface ([`HostDocument`]) and per-record mapping
//!   ([`NativeMapping`]) a CAD host implements
//! - Transaction scoping ([`with_transaction`])
//! - The [`Reconciler`] executing insert, select and delete queries
//! - [`MemoryDocument`], an in-memory host for tests and the CLI
//!
//! ## Insert semantics
//!
//! Every named record is looked up by name in its table. A missing record
//! is created; an existing one is only updated when the query sets
//! `upsert` to `true`, and otherwise left untouched. Each record succeeds
//! or fails on its own, and the result carries the counts:
//!
//! | inserted + updated | failed | status  |
//! |--------------------|--------|---------|
//! | any                | 0      | Success |
//! | 0                  | > 0    | Failure |
//! | > 0                | > 0    | Warning |
//!
//! ## Key Invariants
//!
//! - All changes of one query run in one transaction
//! - A failing record never aborts the batch
//! - An object opened for write is always closed again

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod host;
mod memory;
mod reconcile;

pub use config::ReconcileOptions;
pub use error::{EngineError, EngineResult, HostError, HostResult};
pub use host::{
    with_transaction, CadDocument, Handle, HostDocument, NativeMapping, SymbolRecord, TableKind,
};
pub use memory::{Counters, MemoryDocument, NativeObject, ObjectKind};
pub use reconcile::{DeleteCounts, InsertCounts, Outcome, Reconciler};
