// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON framing shared by the built-in sources.

use fwdd_core::Event;
use serde::Deserialize;

/// Decode newline-separated JSON events. Blank lines are skipped.
pub fn decode_lines(payload: &[u8]) -> Vec<Result<Event, serde_json::Error>> {
    payload
        .split(|b| *b == b'\n')
        .map(|line| line.trim_ascii())
        .filter(|line| !line.is_empty())
        .map(serde_json::from_slice::<Event>)
        .collect()
}

/// Decode a body holding either one JSON event or an array of events.
pub fn decode_batch(body: &[u8]) -> Result<Vec<Event>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Event>),
        One(Event),
    }

    Ok(match serde_json::from_slice(body)? {
        OneOrMany::Many(events) => events,
        OneOrMany::One(event) => vec![event],
    })
}
