// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod contracts;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod wallet;
