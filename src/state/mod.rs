// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

pub mod blockfiles;
pub mod chain;
pub mod options;

pub use chain::Chain;
pub use options::{ChainOptions, ChainOptionsBuilder, ChainType};
