// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Parsers for the `MGRLIST:LIST` and `MGRLIST:STATI` responses.
//!
//! Both responses share one shape: an optional `LIST:<n>` / `STATI:<n>` header,
//! one record per line with `;` separated fields, and a line holding a single
//! `;` that ends the response. Both parsers are pure functions of the text.

mod lines;
mod list;
mod stati;

pub use list::parse_manager_list;
pub use stati::parse_manager_status;

/// Field delimiter and, alone on a line, the response terminator.
pub const DELIMITER: char = ';';
pub const TERMINATOR: &str = ";";
