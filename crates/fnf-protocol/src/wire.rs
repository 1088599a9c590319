//! Outbound line encoding.

use crate::lane::Lane;

/// Action line answered when no lane is engaged.
pub const NO_ACTION: &str = "none";

/// Encode the full per-cycle action set as one line (without terminator):
/// `none`, or a comma-separated, duplicate-free, order-preserving list of
/// lane names.
pub fn format_actions(lanes: &[Lane]) -> String {
    let mut seen: Vec<Lane> = Vec::with_capacity(4);
    for &lane in lanes {
        if !seen.contains(&lane) {
            seen.push(lane);
        }
    }
    if seen.is_empty() {
        NO_ACTION.to_string()
    } else {
        seen.iter()
            .map(|l| l.key_name())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Encode one discrete input event for the deferred strategy.
pub fn input_event_line(lane: Lane, pressed: bool) -> String {
    serde_json::json!({
        "type": "input",
        "keyCode": lane.direction(),
        "pressed": pressed,
    })
    .to_string()
}
