use crate::trace::Trace;
use ::evdev_rs::enums::{int_to_event_type, EventCode};
use ::evdev_rs::util::int_to_event_code;
use std::fmt::Write;

const EVENT_COLUMN: usize = 30;

/// Annotated dump of a trace: its header followed by one section per frame.
/// Synthesized events are marked with a trailing `*`.
pub fn render_diff(trace: &Trace) -> String {
    let mut output = String::new();
    for line in &trace.header {
        output.push_str(line);
        output.push('\n');
    }
    for (index, frame) in trace.frames.iter().enumerate() {
        let _ = writeln!(output, "frame {}:", index + 1);
        for event in &frame.events {
            let (type_name, code_name) = symbolic_names(event.event_type, event.code);
            let _ = writeln!(
                output,
                "    {:<width$}# {} / {}{}",
                event.to_string(),
                type_name,
                code_name,
                if event.is_extra { "*" } else { "" },
                width = EVENT_COLUMN
            );
        }
    }
    output
}

/// Kernel names of an event type and code, e.g. `("EV_ABS", "ABS_MT_SLOT")`.
/// Unknown ones are rendered in hexadecimal.
pub fn symbolic_names(event_type: u16, code: u16) -> (String, String) {
    let type_name = match int_to_event_type(u32::from(event_type)) {
        Some(known) => format!("{:?}", known),
        None => format!("{:#04x}", event_type),
    };
    let code_name = match int_to_event_code(u32::from(event_type), u32::from(code)) {
        EventCode::EV_UNK { .. } => format!("{:#06x}", code),
        known => variant_payload(&format!("{:?}", known)),
    };
    (type_name, code_name)
}

/// `EV_ABS(ABS_MT_SLOT)` -> `ABS_MT_SLOT`
fn variant_payload(debug: &str) -> String {
    match (debug.find('('), debug.rfind(')')) {
        (Some(start), Some(end)) if start < end => debug[start + 1..end].to_string(),
        _ => debug.to_string(),
    }
}
