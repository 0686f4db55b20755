/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
const RUST_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

pub fn print_version() {
    println!("{PKG_NAME} {VERSION}");
    println!("{PKG_DESCRIPTION}");
    println!("Minimum Rust Version: {RUST_VERSION}");
}
