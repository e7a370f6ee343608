pub mod compare;
pub mod database;
pub mod descriptor;
pub mod device_state;
pub mod error;
pub mod event;
pub mod outcome;
pub mod render;
pub mod sets;
pub mod slot;
pub mod trace;

use std::fmt::{self, Display};

pub use crate::compare::{compare, CompareConfig};
pub use crate::database::{kernel_release, Tally, TestDatabase};
pub use crate::error::ParseError;
pub use crate::outcome::{Failure, Outcome, Verdict, Warning};
pub use crate::render::render_diff;
pub use crate::sets::{compare_sets, SetOutcome};
pub use crate::trace::{Frame, Trace};

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorString(pub String);

impl Display for ErrorString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ErrorString {
    fn from(string: String) -> ErrorString {
        ErrorString(string)
    }
}

impl From<&str> for ErrorString {
    fn from(string: &str) -> ErrorString {
        ErrorString(string.to_string())
    }
}

impl From<std::io::Error> for ErrorString {
    fn from(error: std::io::Error) -> ErrorString {
        ErrorString(error.to_string())
    }
}

impl From<ParseError> for ErrorString {
    fn from(error: ParseError) -> ErrorString {
        ErrorString(error.to_string())
    }
}

impl From<glob::PatternError> for ErrorString {
    fn from(error: glob::PatternError) -> ErrorString {
        ErrorString(error.to_string())
    }
}

impl From<glob::GlobError> for ErrorString {
    fn from(error: glob::GlobError) -> ErrorString {
        ErrorString(error.to_string())
    }
}

pub trait AddMessage<T> {
    fn add_message<M: Display>(self, message: M) -> Result<T, ErrorString>;
}

impl<T, E: Display> AddMessage<T> for Result<T, E> {
    fn add_message<M: Display>(self, message: M) -> Result<T, ErrorString> {
        self.map_err(|error| ErrorString(format!("{}: {}", message, error)))
    }
}
