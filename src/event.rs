use crate::error::ParseError;
use std::fmt;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0x00;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
const ABS_MT_LAST: u16 = 0x3d;

const SYN_MT_REPORT_VALUE: i32 = 1;
const KEY_REPEAT_VALUE: i32 = 2;

/// Closed classification of an event by its `(type, code, value)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `EV_SYN / SYN_REPORT` with value 0: terminates a frame.
    SynReport,
    /// `EV_SYN / SYN_REPORT` with value 1: at most once per frame.
    SynMtReport,
    /// Any other `EV_SYN` event, passed through as is.
    Sync,
    /// `EV_KEY` with value 2.
    KeyRepeat,
    SlotSelect,
    /// `ABS_MT_*` axes other than the slot selector.
    MtAxis,
    /// Non multitouch absolute axes, carried forward at device level.
    Abs,
    Other,
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: f64,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
    pub is_extra: bool,
}

/// Time and provenance don't take part in equality.
impl PartialEq for Event {
    fn eq(&self, other: &Event) -> bool {
        self.event_type == other.event_type && self.code == other.code && self.value == other.value
    }
}

impl Eq for Event {}

impl Event {
    pub fn new(time: f64, event_type: u16, code: u16, value: i32) -> Event {
        Event {
            time,
            event_type,
            code,
            value,
            is_extra: false,
        }
    }

    pub fn syn_mt_report(time: f64) -> Event {
        Event::new(time, EV_SYN, SYN_REPORT, SYN_MT_REPORT_VALUE)
    }

    pub fn slot_select(time: f64, slot: i32) -> Event {
        Event::new(time, EV_ABS, ABS_MT_SLOT, slot)
    }

    /// Marks the event as synthesized rather than read from the trace.
    pub fn extra(self) -> Event {
        Event {
            is_extra: true,
            ..self
        }
    }

    pub fn kind(&self) -> EventKind {
        match (self.event_type, self.code, self.value) {
            (EV_SYN, SYN_REPORT, 0) => EventKind::SynReport,
            (EV_SYN, SYN_REPORT, SYN_MT_REPORT_VALUE) => EventKind::SynMtReport,
            (EV_SYN, _, _) => EventKind::Sync,
            (EV_KEY, _, KEY_REPEAT_VALUE) => EventKind::KeyRepeat,
            (EV_ABS, ABS_MT_SLOT, _) => EventKind::SlotSelect,
            (EV_ABS, code, _) if code > ABS_MT_SLOT && code <= ABS_MT_LAST => EventKind::MtAxis,
            (EV_ABS, _, _) => EventKind::Abs,
            _ => EventKind::Other,
        }
    }

    pub fn is_slot_select(&self) -> bool {
        self.kind() == EventKind::SlotSelect
    }

    /// Parses `E: <time> <type> <code> <value> [# comment]`, with `type` and
    /// `code` in hexadecimal and `value` in signed decimal.
    pub fn parse(line: &str, line_number: usize) -> Result<Event, ParseError> {
        let stripped = match line.find('#') {
            Some(index) => &line[..index],
            None => line,
        };
        let fields: Vec<&str> = stripped.split_whitespace().collect();
        match fields.as_slice() {
            ["E:", time, event_type, code, value] => Ok(Event::new(
                parse_field(line_number, "time", time, |s| s.parse::<f64>().ok())?,
                parse_field(line_number, "type", event_type, |s| {
                    u16::from_str_radix(s, 16).ok()
                })?,
                parse_field(line_number, "code", code, |s| u16::from_str_radix(s, 16).ok())?,
                parse_field(line_number, "value", value, |s| s.parse::<i32>().ok())?,
            )),
            _ => Err(ParseError::FieldCount {
                line: line_number,
                text: line.trim_end().to_string(),
            }),
        }
    }
}

fn parse_field<T, F>(line: usize, field: &'static str, input: &str, parse: F) -> Result<T, ParseError>
where
    F: Fn(&str) -> Option<T>,
{
    parse(input).ok_or_else(|| ParseError::InvalidField {
        line,
        field,
        value: input.to_string(),
    })
}

/// The canonical `<type> <code> <value>` form used in dumps.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x} {:04x} {}", self.event_type, self.code, self.value)
    }
}
