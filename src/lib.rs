// SPDX-FileCopyrightText: 2022 DCsunset
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory, single-threaded simulator of the Chord DHT ring algorithms.
//!
//! There is no networking here: every "remote" operation in the Chord
//! paper (an RPC to a peer) is instead a direct lookup against a shared
//! [`chord::Topology`]. The [`interpreter`] module turns text commands
//! into calls against that topology and formats the results.

pub mod chord;
pub mod core;
pub mod interpreter;

pub use core::{DhtError, DhtResult};
