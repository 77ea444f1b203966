// SPDX-FileCopyrightText: 2022 DCsunset
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The Chord ring: identifier arithmetic, the node record, the topology
//! registry, and the routing/maintenance algorithms that operate on them.

pub mod algorithms;
pub mod node;
pub mod ring;
pub mod topology;

pub use node::{Node, Predecessor};
pub use topology::Topology;
