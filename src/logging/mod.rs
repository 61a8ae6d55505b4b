// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

pub mod logger;

pub use logger::{disable_logging, set_log_level, set_logger, Log, LogLevel, Logger};
