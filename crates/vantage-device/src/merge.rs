//! Merging of LOOP1 and LOOP2 records into the rich realtime record.

use vantage_schema::{Record, Value};

/// Fields LOOP2 supersedes or that make no sense on a merged record.
const LOOP1_DROPPED: [&str; 3] = ["alarms", "package_type", "next_archive_record"];
const LOOP2_DROPPED: [&str; 3] = ["et", "package_type", "graph_pointers"];

/// Deep-merge `overlay` into `target`.
///
/// Nested records merge recursively; on every other conflict the overlay
/// wins. Target-only and overlay-only fields are kept.
pub fn deep_merge(target: &mut Record, overlay: Record) {
    for (name, value) in overlay {
        match (target.get_mut(&name), value) {
            (Some(Value::Record(existing)), Value::Record(inner)) => {
                deep_merge(existing, inner);
            }
            (Some(slot), value) => *slot = value,
            (None, value) => target.insert(name, value),
        }
    }
}

/// Combine a LOOP1 and a LOOP2 record into the rich realtime record.
///
/// Both records are trimmed of the fields the merged view does not carry,
/// then deep-merged with LOOP2 winning. The two `rain` substructures are
/// merged separately (LOOP2 wins there too) and re-attached, so the result
/// carries LOOP1's day/month/year totals next to LOOP2's recent-interval
/// counters.
pub fn rich_realtime(loop1: Record, loop2: Record) -> Record {
    let mut merged = loop1;
    let loop1_rain = merged.remove("rain");
    for name in LOOP1_DROPPED {
        merged.remove(name);
    }

    let mut overlay = loop2;
    let loop2_rain = overlay.remove("rain");
    for name in LOOP2_DROPPED {
        overlay.remove(name);
    }

    deep_merge(&mut merged, overlay);

    let rain = match (loop1_rain, loop2_rain) {
        (Some(Value::Record(mut base)), Some(Value::Record(overlay))) => {
            deep_merge(&mut base, overlay);
            Value::Record(base)
        }
        (_, Some(overlay)) => overlay,
        (Some(base), None) => base,
        (None, None) => Value::Record(Record::new()),
    };
    merged.insert("rain", rain);

    merged
}
