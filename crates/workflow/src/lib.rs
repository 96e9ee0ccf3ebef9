// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod controller;
mod countdown;
mod error;
mod input;
mod state;

pub use controller::*;
pub use error::*;
pub use input::*;
pub use state::*;
