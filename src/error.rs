use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected 'E: <time> <type> <code> <value>', got '{text}'")]
    FieldCount { line: usize, text: String },
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: malformed axis description '{text}'")]
    MalformedAxis { line: usize, text: String },
    #[error("line {line}: malformed version marker '{text}'")]
    MalformedVersion { line: usize, text: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::FieldCount { line, .. }
            | ParseError::InvalidField { line, .. }
            | ParseError::MalformedAxis { line, .. }
            | ParseError::MalformedVersion { line, .. } => *line,
        }
    }
}
