use crate::error::ParseError;
use crate::event::ABS_MT_SLOT;
use crate::outcome::{Failure, Warning};
use std::fmt;

/// Format version of a trace, as given by `# EVEMU <major>.<minor>`.
pub type Version = (u32, u32);

const RESOLUTION_VERSION: Version = (1, 2);
const VERSION_MARKER: &str = "# EVEMU";
const PROPERTY_PREFIX: &str = "P:";

/// Calibration of one absolute axis (`A:` line).
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub code: u16,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: Option<i32>,
}

impl AxisSpec {
    /// Versions from 1.2 on carry a sixth `resolution` field. Without a
    /// version marker both layouts are accepted.
    pub fn parse(line: &str, version: Option<Version>, line_number: usize) -> Result<AxisSpec, ParseError> {
        let malformed = || ParseError::MalformedAxis {
            line: line_number,
            text: line.trim_end().to_string(),
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        let expected_len = match version {
            Some(version) if version >= RESOLUTION_VERSION => Some(7),
            Some(_) => Some(6),
            None => None,
        };
        let len_ok = match expected_len {
            Some(len) => fields.len() == len,
            None => fields.len() == 6 || fields.len() == 7,
        };
        if !len_ok || fields[0] != "A:" {
            return Err(malformed());
        }
        let number = |s: &str| s.parse::<i32>().map_err(|_| malformed());
        Ok(AxisSpec {
            code: u16::from_str_radix(fields[1], 16).map_err(|_| malformed())?,
            minimum: number(fields[2])?,
            maximum: number(fields[3])?,
            fuzz: number(fields[4])?,
            flat: number(fields[5])?,
            resolution: match fields.get(6) {
                Some(field) => Some(number(field)?),
                None => None,
            },
        })
    }

    /// A missing resolution on either side matches any resolution.
    pub fn matches(&self, other: &AxisSpec) -> bool {
        let resolution = match (self.resolution, other.resolution) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        self.code == other.code
            && self.minimum == other.minimum
            && self.maximum == other.maximum
            && self.fuzz == other.fuzz
            && self.flat == other.flat
            && resolution
    }
}

impl fmt::Display for AxisSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "A: {:02x} {} {} {} {}",
            self.code, self.minimum, self.maximum, self.fuzz, self.flat
        )?;
        if let Some(resolution) = self.resolution {
            write!(f, " {}", resolution)?;
        }
        Ok(())
    }
}

/// Static metadata that identifies a device, read from the trace header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub version: Option<Version>,
    pub name: Option<String>,
    pub axis_specs: Vec<AxisSpec>,
    pub extra_lines: Vec<String>,
}

impl Descriptor {
    /// Consumes one non-event header line. Comments other than the version
    /// marker and blank lines don't describe the device.
    pub fn add_line(&mut self, line: &str, line_number: usize) -> Result<(), ParseError> {
        let line = line.trim_end();
        if line.starts_with(VERSION_MARKER) {
            self.version = Some(parse_version(line, line_number)?);
        } else if line.starts_with("N:") {
            self.name = Some(line["N:".len()..].trim().to_string());
        } else if line.starts_with("A:") {
            self.axis_specs
                .push(AxisSpec::parse(line, self.version, line_number)?);
        } else if !line.starts_with('#') && !line.trim().is_empty() {
            self.extra_lines.push(line.to_string());
        }
        Ok(())
    }

    pub fn parse(text: &str) -> Result<Descriptor, ParseError> {
        let mut descriptor = Descriptor::default();
        for (index, line) in text.lines().enumerate() {
            if !line.starts_with("E:") {
                descriptor.add_line(line, index + 1)?;
            }
        }
        Ok(descriptor)
    }
}

fn parse_version(line: &str, line_number: usize) -> Result<Version, ParseError> {
    let malformed = || ParseError::MalformedVersion {
        line: line_number,
        text: line.to_string(),
    };
    let version = line[VERSION_MARKER.len()..].trim();
    let mut parts = version.splitn(2, '.');
    let major = parts.next().and_then(|part| part.parse().ok());
    let minor = parts.next().and_then(|part| part.parse().ok());
    match (major, minor) {
        (Some(major), Some(minor)) => Ok((major, minor)),
        _ => Err(malformed()),
    }
}

/// Result of matching two descriptors. `mismatch` is set for differences
/// that identify another device; tolerated ones end up in `warnings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorMatch {
    pub mismatch: Option<Failure>,
    pub warnings: Vec<Warning>,
}

impl DescriptorMatch {
    pub fn matches(&self) -> bool {
        self.mismatch.is_none()
    }

    pub fn warning(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub fn match_descriptor(expected: &Descriptor, actual: &Descriptor) -> DescriptorMatch {
    let mut result = DescriptorMatch::default();
    if let Err(failure) = match_into(expected, actual, &mut result.warnings) {
        result.mismatch = Some(failure);
    }
    result
}

fn match_into(expected: &Descriptor, actual: &Descriptor, warnings: &mut Vec<Warning>) -> Result<(), Failure> {
    if expected.axis_specs.len() != actual.axis_specs.len() {
        return Err(Failure::Descriptor {
            detail: format!(
                "got {} axes, instead of {}",
                actual.axis_specs.len(),
                expected.axis_specs.len()
            ),
        });
    }
    for (expected_axis, actual_axis) in expected.axis_specs.iter().zip(&actual.axis_specs) {
        if expected_axis.matches(actual_axis) {
            continue;
        }
        if expected_axis.code == ABS_MT_SLOT && actual_axis.code == ABS_MT_SLOT {
            warnings.push(Warning::SlotAxis {
                expected: expected_axis.to_string(),
                actual: actual_axis.to_string(),
            });
        } else {
            return Err(Failure::Descriptor {
                detail: format!("got '{}' instead of '{}'", actual_axis, expected_axis),
            });
        }
    }

    let (expected_lines, actual_lines) = cleanup_properties(&expected.extra_lines, &actual.extra_lines);
    if expected_lines.len() != actual_lines.len() {
        return Err(Failure::Descriptor {
            detail: format!(
                "got {} lines, instead of {}",
                actual_lines.len(),
                expected_lines.len()
            ),
        });
    }
    for (index, (expected_line, actual_line)) in expected_lines.iter().zip(&actual_lines).enumerate() {
        if expected_line != actual_line {
            return Err(Failure::Descriptor {
                detail: format!(
                    "line {}: got '{}' instead of '{}'",
                    index + 1,
                    actual_line,
                    expected_line
                ),
            });
        }
    }

    if expected.name != actual.name {
        warnings.push(Warning::NameChanged {
            expected: expected.name.clone(),
            actual: actual.name.clone(),
        });
    }
    Ok(())
}

/// Some capture tool versions omit property lines. When the two sides
/// differ by exactly one line and only one of them has property lines the
/// other lacks, those are dropped from that side.
pub fn cleanup_properties<'a>(expected: &'a [String], actual: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let expected_lines: Vec<&str> = expected.iter().map(String::as_str).collect();
    let actual_lines: Vec<&str> = actual.iter().map(String::as_str).collect();
    let length_difference = (expected_lines.len() as isize - actual_lines.len() as isize).abs();
    if length_difference != 1 {
        return (expected_lines, actual_lines);
    }
    let only_in = |lines: &[&'a str], other: &[&'a str]| -> Vec<&'a str> {
        lines
            .iter()
            .filter(|line| line.starts_with(PROPERTY_PREFIX) && !other.contains(*line))
            .cloned()
            .collect()
    };
    let expected_only = only_in(&expected_lines, &actual_lines);
    let actual_only = only_in(&actual_lines, &expected_lines);
    let without = |lines: &[&'a str], dropped: &[&'a str]| -> Vec<&'a str> {
        lines
            .iter()
            .filter(|line| !dropped.contains(*line))
            .cloned()
            .collect()
    };
    match (expected_only.is_empty(), actual_only.is_empty()) {
        (false, true) => (without(&expected_lines, &expected_only), actual_lines),
        (true, false) => (expected_lines, without(&actual_lines, &actual_only)),
        _ => (expected_lines, actual_lines),
    }
}
