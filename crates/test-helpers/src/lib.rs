// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod board;
mod environment;
mod gate;
mod sdk;
mod wallet;

pub use board::*;
pub use environment::*;
pub use gate::*;
pub use sdk::*;
pub use wallet::*;
