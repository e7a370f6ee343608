use crate::descriptor::Descriptor;
use crate::device_state::DeviceState;
use crate::error::ParseError;
use crate::event::{Event, EventKind, ABS_MT_SLOT};
use crate::{AddMessage, ErrorString};
use log::debug;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Events observed between two consecutive `SYN_REPORT`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub timestamp: f64,
    pub source_line: usize,
    pub events: Vec<Event>,
}

impl Frame {
    /// The events taking part in comparisons: slot selection is left out.
    pub fn comparable_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|event| !event.is_slot_select())
    }
}

enum Assembly {
    Idle,
    InFrame(Vec<Event>),
}

impl Assembly {
    fn push(&mut self, event: Event) {
        match self {
            Assembly::Idle => *self = Assembly::InFrame(vec![event]),
            Assembly::InFrame(events) => events.push(event),
        }
    }

    fn extend(&mut self, events: Vec<Event>) {
        for event in events {
            self.push(event);
        }
    }

    fn contains(&self, event: &Event) -> bool {
        match self {
            Assembly::Idle => false,
            Assembly::InFrame(events) => events.contains(event),
        }
    }

    fn take(&mut self) -> Option<Vec<Event>> {
        match std::mem::replace(self, Assembly::Idle) {
            Assembly::Idle => None,
            Assembly::InFrame(events) => Some(events),
        }
    }
}

/// Groups a stream of `(line number, event)` pairs into frames, filling in
/// carried-forward state at every frame boundary.
pub struct FrameSource<I: Iterator<Item = (usize, Event)>> {
    events: I,
    state: DeviceState,
    assembly: Assembly,
    last: (usize, f64),
    done: bool,
}

impl<I: Iterator<Item = (usize, Event)>> FrameSource<I> {
    pub fn new(events: I) -> FrameSource<I> {
        FrameSource {
            events,
            state: DeviceState::new(),
            assembly: Assembly::Idle,
            last: (0, 0.0),
            done: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn into_state(self) -> DeviceState {
        self.state
    }

    fn feed(&mut self, line: usize, event: Event) -> Option<Frame> {
        self.last = (line, event.time);
        match event.kind() {
            EventKind::SynReport => {
                self.flush_slot();
                return self.flush_frame(Some(event));
            }
            EventKind::SynMtReport => {
                if !self.assembly.contains(&event) {
                    self.assembly.push(event);
                }
            }
            EventKind::KeyRepeat => {}
            EventKind::SlotSelect => {
                self.flush_slot();
                self.state.select_slot(event.value).add_event(event);
                self.state.add_event(event);
                self.assembly.push(event);
            }
            EventKind::MtAxis => {
                let slot = self.state.current_slot();
                if !slot.is_updated(ABS_MT_SLOT) {
                    let injected = Event::slot_select(event.time, slot.id()).extra();
                    debug!("line {}: injecting slot {} selection", line, slot.id());
                    slot.add_event(injected);
                    self.assembly.push(injected);
                }
                slot.add_event(event);
                self.assembly.push(event);
            }
            EventKind::Abs => {
                self.state.add_event(event);
                self.assembly.push(event);
            }
            EventKind::Sync | EventKind::Other => self.assembly.push(event),
        }
        None
    }

    fn flush_slot(&mut self) {
        let carried = self.state.current_slot().get_non_updated_events();
        self.assembly.extend(carried);
    }

    fn flush_frame(&mut self, trigger: Option<Event>) -> Option<Frame> {
        let carried = self.state.get_non_updated_events();
        let (line, time) = self.last;
        let mut events = match (self.assembly.take(), trigger) {
            (Some(events), _) => events,
            (None, Some(_)) => {
                debug!("line {}: dropping empty frame", line);
                return None;
            }
            // End of input: stale device axes make up one closing frame.
            (None, None) => {
                if carried.iter().all(Event::is_slot_select) {
                    return None;
                }
                debug!("line {}: closing the trace with carried device state", line);
                vec![]
            }
        };
        events.extend(carried);
        if let Some(trigger) = trigger {
            events.push(trigger);
        }
        if !events.iter().any(|event| event.kind() == EventKind::SynMtReport) {
            events.push(Event::syn_mt_report(time).extra());
        }
        Some(Frame {
            timestamp: time,
            source_line: line,
            events,
        })
    }
}

impl<I: Iterator<Item = (usize, Event)>> Iterator for FrameSource<I> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while !self.done {
            match self.events.next() {
                None => {
                    self.done = true;
                    self.flush_slot();
                    return self.flush_frame(None);
                }
                Some((line, event)) => {
                    if let Some(frame) = self.feed(line, event) {
                        return Some(frame);
                    }
                }
            }
        }
        None
    }
}

/// A parsed event log: its header and the frames of its event stream.
#[derive(Debug, Clone)]
pub struct Trace {
    pub header: Vec<String>,
    pub descriptor: Descriptor,
    pub frames: Vec<Frame>,
}

impl Trace {
    pub fn parse(text: &str) -> Result<Trace, ParseError> {
        let mut header = vec![];
        let mut descriptor = Descriptor::default();
        let mut events = vec![];
        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            if line.starts_with("E:") {
                events.push((line_number, Event::parse(line, line_number)?));
            } else {
                descriptor.add_line(line, line_number)?;
                header.push(line.to_string());
            }
        }

        let mut frames: Vec<Frame> = FrameSource::new(events.into_iter()).collect();
        if is_disconnect_artifact(&frames) {
            debug!("dropping the lone frame sent on disconnect");
            frames.clear();
        }
        Ok(Trace {
            header,
            descriptor,
            frames,
        })
    }

    pub fn load(path: &Path) -> Result<Trace, ErrorString> {
        let text = fs::read_to_string(path).add_message(format!("can't read {}", path.display()))?;
        Trace::parse(&text).add_message(path.display().to_string())
    }
}

impl FromStr for Trace {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Trace, ParseError> {
        Trace::parse(text)
    }
}

fn is_disconnect_artifact(frames: &[Frame]) -> bool {
    match frames {
        [frame] => match frame.events.as_slice() {
            [event] => event.kind() == EventKind::SynMtReport,
            _ => false,
        },
        _ => false,
    }
}
