// SPDX-FileCopyrightText: 2022 DCsunset
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod error;

pub use error::*;
