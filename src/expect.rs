//! Response validation against queued expectations.
//!
//! Before each command is issued, the expected leading bytes of its response
//! are pushed here. When the matching notification arrives, the oldest
//! outstanding expectation is popped (FIFO) and compared. The harness keeps
//! exactly one expectation outstanding at a time, but the queue is strictly
//! first-in-first-out so that the pairing stays correct even if that ever
//! changes.

use std::collections::VecDeque;

use crate::command::hex_str;

/// Outcome of one command/response exchange.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Step label for log output.
    pub label: String,
    /// Expected leading bytes of the response.
    pub expected: Vec<u8>,
    /// The notification payload that was consumed, if one arrived in time.
    pub actual: Option<Vec<u8>>,
    /// Whether the response matched the expectation.
    pub matched: bool,
}

impl StepRecord {
    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        let actual = match &self.actual {
            Some(data) => hex_str(data),
            None => "<no response>".to_string(),
        };
        format!(
            "{}: expected {} got {} -> {}",
            self.label,
            hex_str(&self.expected),
            actual,
            if self.matched { "ok" } else { "MISMATCH" },
        )
    }
}

/// Compare a received payload against an expected pattern.
///
/// Only the leading `expected.len()` bytes of `actual` are compared;
/// trailing bytes are ignored. A payload shorter than the expectation never
/// matches.
pub fn prefix_matches(expected: &[u8], actual: &[u8]) -> bool {
    actual.len() >= expected.len() && actual[..expected.len()] == *expected
}

/// FIFO queue of expected response patterns.
#[derive(Debug, Default)]
pub struct ExpectQueue {
    pending: VecDeque<Vec<u8>>,
}

impl ExpectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the expected leading bytes of the next response.
    pub fn push(&mut self, expected: Vec<u8>) {
        self.pending.push_back(expected);
    }

    /// Consume the oldest outstanding expectation and compare the payload
    /// against it. Returns `None` if nothing was expected, in which case the
    /// payload is discarded (non-fatal, mirrors unsolicited notifications).
    pub fn check(&mut self, payload: &[u8]) -> Option<(Vec<u8>, bool)> {
        let expected = self.pending.pop_front()?;
        let matched = prefix_matches(&expected, payload);
        Some((expected, matched))
    }

    /// Discard the oldest outstanding expectation without a payload, for
    /// when the response deadline expired. Returns the expectation so the
    /// caller can record the miss.
    pub fn expire(&mut self) -> Option<Vec<u8>> {
        self.pending.pop_front()
    }

    /// Number of expectations still outstanding.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
