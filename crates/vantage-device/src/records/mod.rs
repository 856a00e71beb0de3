//! Schema tables for the console record layouts.
//!
//! Positions are byte offsets into the CRC-stripped payload (ACK removed,
//! offset 0 at the `LOO` magic for LOOP packets). Dash sentinels and unit
//! transforms follow the console conventions: temperatures in tenths of °F
//! (extra sensors biased by +90), pressure in thousandths of inHg, rain in
//! bucket clicks of 0.01 in, times encoded as `hour * 100 + minute`.

mod hilow;
mod loop1;
mod loop2;

use std::sync::LazyLock;

use vantage_schema::Schema;

static LOOP1: LazyLock<Schema> = LazyLock::new(loop1::schema);
static LOOP2: LazyLock<Schema> = LazyLock::new(loop2::schema);
static HILOW: LazyLock<Schema> = LazyLock::new(hilow::schema);

/// The LOOP1 packet layout (97-byte payload).
pub fn loop1() -> &'static Schema {
    &LOOP1
}

/// The LOOP2 packet layout (97-byte payload).
pub fn loop2() -> &'static Schema {
    &LOOP2
}

/// The HILOWS packet layout (436-byte payload).
pub fn hilow() -> &'static Schema {
    &HILOW
}
