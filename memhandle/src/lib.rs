//! Memory handles for the virtual machine.
//!
//! The interpreter and object model never refer to memory by address.
//! Instead, every object, array, and piece of class metadata
//! lives in a [`Handle`]: a fixed-size byte payload with a small header.
//! Handles are owned by a [`HandleTable`], which gives out [`HandleRef`]s,
//! small copyable references that the table validates on every use.
//!
//! # Identifiers
//!
//! Each handle has a random 32-bit identifier, unique within its table.
//! The low bits of the identifier are the index of the slot that holds it,
//! so a handle can be found from its identifier without a search.
//! When the table grows, existing identifiers are kept as they are;
//! each handle remembers the slot mask that was in effect at its creation.
//!
//! # Payloads
//!
//! Payloads are accessed with bounds checks, either as raw bytes
//! or as values of a [`DataType`]. Values are stored big-endian.
//!
//! # Lifetimes
//!
//! The reference count of a handle is bookkeeping for the collector;
//! this crate initializes it to one and otherwise leaves it alone.
//! Handles are freed only by [`HandleTable::delete`]
//! and [`HandleTable::destroy`], which zero them first.

#![warn(missing_docs)]

pub use self::{
    config::*,
    data_type::*,
    error::*,
    handle::*,
    kind::*,
    random::*,
    table::*,
};

mod config;
mod data_type;
mod error;
mod handle;
mod kind;
mod random;
mod table;
