// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

//! The `btck_` C ABI.
//!
//! Objects cross the boundary as opaque, reference-counted handles (see
//! [`handle`]). Fallible functions take a trailing `btck_Error**` that is
//! written only on failure. The declarations are mirrored in
//! `include/btck.h`.

#![allow(non_camel_case_types, non_snake_case)]

pub mod block;
pub mod c_helpers;
pub mod chain;
pub mod constants;
pub mod error;
pub mod handle;
pub mod logging;
pub mod script;
pub mod sink;
pub mod transaction;
pub mod verify;

pub use c_helpers::{success, to_c_bool, to_c_result};
pub use constants::*;
pub use error::btck_Error;
pub use handle::Handle;
pub use sink::btck_WriteBytes;
