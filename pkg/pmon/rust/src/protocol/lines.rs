// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use super::TERMINATOR;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HeaderTag {
    List,
    Stati,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Header {
    pub tag: HeaderTag,
    /// Advisory only; the supervisor has been seen reporting wrong counts.
    pub count: usize,
}

/// A trimmed, non-blank line and its 1-based position in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// The body of a response: everything between the optional header and the
/// first terminator line.
#[derive(Debug, Default)]
pub(super) struct Response<'a> {
    pub header: Option<Header>,
    pub lines: Vec<Line<'a>>,
    pub terminated: bool,
}

impl<'a> Response<'a> {
    /// Single pass over `text`. Blank lines are dropped and anything after the
    /// terminator is ignored.
    pub fn scan(text: &'a str) -> Self {
        let mut response = Response::default();
        let mut seen_content = false;

        for (idx, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == TERMINATOR {
                response.terminated = true;
                break;
            }
            if !seen_content {
                seen_content = true;
                if let Some(header) = parse_header(trimmed) {
                    response.header = Some(header);
                    continue;
                }
            }
            response.lines.push(Line {
                number: idx + 1,
                text: trimmed,
            });
        }
        response
    }

    /// True when the text held nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.header.is_none() && self.lines.is_empty() && !self.terminated
    }

    /// Logs when the header count disagrees with what was parsed. Never fails.
    pub fn check_count(&self, parsed: usize) {
        if let Some(header) = self.header
            && header.count != parsed
        {
            warn!(
                "{:?} header announced {} entries, parsed {parsed}",
                header.tag, header.count
            );
        }
    }
}

fn parse_header(line: &str) -> Option<Header> {
    let (tag, count) = line.split_once(':')?;
    let tag = match tag.trim().to_ascii_uppercase().as_str() {
        "LIST" => HeaderTag::List,
        "STATI" => HeaderTag::Stati,
        _ => return None,
    };
    let count = count.trim().parse().ok()?;
    Some(Header { tag, count })
}
