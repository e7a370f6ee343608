use crate::event::Event;
use std::fmt;
use thiserror::Error;

/// Hard comparison failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Failure {
    #[error("description differs: {detail}")]
    Descriptor { detail: String },
    #[error("too many events, should get only {expected} frames instead of {actual}")]
    TooManyFrames { expected: usize, actual: usize },
    #[error("too few events, should get {expected} frames instead of {actual}")]
    TooFewFrames { expected: usize, actual: usize },
    #[error("line {line}, frame {frame}: got {actual} events instead of {expected}")]
    EventCount {
        frame: usize,
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}, frame {frame}: '{event}' not in {}", render_events(.remaining))]
    MissingEvent {
        frame: usize,
        line: usize,
        event: Event,
        remaining: Vec<Event>,
    },
    #[error("no matching device, {frames} frames received -> test failed")]
    UnmatchedDevice { frames: usize },
    #[error("no reference traces to compare against")]
    NoReference,
    #[error("none of the captured devices matches a reference trace")]
    NothingMatched,
}

/// Differences that let a comparison pass, but not silently.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Warning {
    #[error("device name changed from {expected:?} to {actual:?}")]
    NameChanged {
        expected: Option<String>,
        actual: Option<String>,
    },
    #[error("got '{actual}' instead of '{expected}', slot definition may be harmless, continuing...")]
    SlotAxis { expected: String, actual: String },
    #[error("line {line}, frame {frame}: timestamps differ too much -> {drift:.6} at {at:.6}")]
    TimingDrift {
        frame: usize,
        line: usize,
        drift: f64,
        at: f64,
    },
}

fn render_events(events: &[Event]) -> String {
    let rendered: Vec<String> = events.iter().map(|event| event.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    Failed(Failure),
    Warned(Warning),
    Noted(String),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Finding::Failed(failure) => write!(f, "{}", failure),
            Finding::Warned(warning) => write!(f, "{}", warning),
            Finding::Noted(note) => write!(f, "{}", note),
        }
    }
}

/// Everything a comparison found, in the order it was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    findings: Vec<Finding>,
}

impl Outcome {
    pub fn fail(&mut self, failure: Failure) {
        self.findings.push(Finding::Failed(failure));
    }

    pub fn warn(&mut self, warning: Warning) {
        self.findings.push(Finding::Warned(warning));
    }

    pub fn note(&mut self, note: String) {
        self.findings.push(Finding::Noted(note));
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.findings.iter().filter_map(|finding| match finding {
            Finding::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.findings.iter().filter_map(|finding| match finding {
            Finding::Warned(warning) => Some(warning),
            _ => None,
        })
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn warning(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn verdict(&self) -> Verdict {
        if !self.passed() {
            Verdict::Fail
        } else if self.warning() {
            Verdict::Warn
        } else {
            Verdict::Match
        }
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.findings.iter().map(|finding| finding.to_string()).collect()
    }
}
