use crate::descriptor::match_descriptor;
use crate::event::Event;
use crate::outcome::{Failure, Outcome, Warning};
use crate::trace::{Frame, Trace};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompareConfig {
    /// Largest tolerated difference, in seconds, between the inter-frame
    /// delays of both traces. 0 disables the check.
    pub timing_tolerance: f64,
}

/// Checks `actual` against the trusted `expected` trace.
pub fn compare(expected: &Trace, actual: &Trace, config: CompareConfig) -> Outcome {
    let mut outcome = Outcome::default();
    let descriptors = match_descriptor(&expected.descriptor, &actual.descriptor);
    for warning in descriptors.warnings {
        outcome.warn(warning);
    }
    if let Some(mismatch) = descriptors.mismatch {
        outcome.fail(mismatch);
        return outcome;
    }
    if let Err(failure) = compare_frames(&expected.frames, &actual.frames, config, &mut outcome) {
        outcome.fail(failure);
    }
    outcome
}

fn compare_frames(
    expected: &[Frame],
    actual: &[Frame],
    config: CompareConfig,
    outcome: &mut Outcome,
) -> Result<(), Failure> {
    if expected.len() < actual.len() {
        return Err(Failure::TooManyFrames {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    if expected.len() > actual.len() {
        return Err(Failure::TooFewFrames {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    let mut drift = DriftCheck::new(config.timing_tolerance);
    for (index, (expected_frame, actual_frame)) in expected.iter().zip(actual).enumerate() {
        compare_frame(index + 1, expected_frame, actual_frame)?;
        if let Some(warning) = drift.check(index + 1, expected_frame, actual_frame) {
            outcome.warn(warning);
        }
    }
    Ok(())
}

/// Order-insensitive comparison of two frames, `number` being 1-based.
/// Each expected event consumes the first equal event left in `actual`.
pub fn compare_frame(number: usize, expected: &Frame, actual: &Frame) -> Result<(), Failure> {
    let wanted: Vec<&Event> = expected.comparable_events().collect();
    let mut remaining: Vec<Event> = actual.comparable_events().cloned().collect();
    if wanted.len() != remaining.len() {
        return Err(Failure::EventCount {
            frame: number,
            line: actual.source_line,
            expected: wanted.len(),
            actual: remaining.len(),
        });
    }
    for event in wanted {
        match remaining.iter().position(|candidate| candidate == event) {
            Some(position) => {
                remaining.remove(position);
            }
            None => {
                return Err(Failure::MissingEvent {
                    frame: number,
                    line: actual.source_line,
                    event: *event,
                    remaining,
                })
            }
        }
    }
    Ok(())
}

struct DriftCheck {
    tolerance: f64,
    previous: Option<(f64, f64)>,
}

impl DriftCheck {
    fn new(tolerance: f64) -> DriftCheck {
        DriftCheck {
            tolerance,
            previous: None,
        }
    }

    fn check(&mut self, number: usize, expected: &Frame, actual: &Frame) -> Option<Warning> {
        let (previous_expected, previous_actual) = self
            .previous
            .unwrap_or((expected.timestamp, actual.timestamp));
        self.previous = Some((expected.timestamp, actual.timestamp));
        let expected_delta = expected.timestamp - previous_expected;
        let actual_delta = actual.timestamp - previous_actual;
        if self.tolerance > 0.0 && (expected_delta - actual_delta).abs() > self.tolerance {
            Some(Warning::TimingDrift {
                frame: number,
                line: actual.source_line,
                drift: actual_delta - expected_delta,
                at: actual.timestamp,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::outcome::Verdict;
    use crate::trace::test::mk_trace;

    const HEADER: &str = "# EVEMU 1.2\nN: Touchscreen\nA: 2f 0 9 0 0 0\nA: 39 0 65535 0 0 0\n";

    fn mk(events: &str) -> Trace {
        mk_trace(&format!("{}{}", HEADER, events))
    }

    fn check(expected: &str, actual: &str) -> Outcome {
        compare(&mk(expected), &mk(actual), CompareConfig::default())
    }

    const TWO_CONTACTS: &str = "E: 0.1 0003 002f 0
E: 0.1 0003 0039 5
E: 0.1 0003 0035 23
E: 0.1 0003 002f 1
E: 0.1 0003 0039 6
E: 0.1 0003 0035 800
E: 0.1 0000 0000 0
E: 0.2 0003 002f 0
E: 0.2 0003 0035 24
E: 0.2 0000 0000 0
";

    #[test]
    fn matches_identical_traces() {
        assert_eq!(check(TWO_CONTACTS, TWO_CONTACTS).verdict(), Verdict::Match);
    }

    #[test]
    fn matches_device_axes_whether_slots_are_selected_or_not() {
        use crate::trace::test::device_axes_with_slots::{with_explicit_selection, with_injected_selection};
        let explicit = mk_trace(&with_explicit_selection());
        let injected = mk_trace(&with_injected_selection());
        let config = CompareConfig::default();
        assert_eq!(compare(&explicit, &injected, config).verdict(), Verdict::Match);
        assert_eq!(compare(&injected, &explicit, config).verdict(), Verdict::Match);
    }

    mod order_insensitivity {
        use super::*;

        #[test]
        fn accepts_reordered_contacts() {
            let reordered = "E: 0.1 0003 002f 1
E: 0.1 0003 0039 6
E: 0.1 0003 0035 800
E: 0.1 0003 002f 0
E: 0.1 0003 0039 5
E: 0.1 0003 0035 23
E: 0.1 0000 0000 0
E: 0.2 0003 002f 0
E: 0.2 0003 0035 24
E: 0.2 0000 0000 0
";
            assert!(check(TWO_CONTACTS, reordered).passed());
        }

        #[test]
        fn accepts_slot_selection_after_the_contact() {
            let expected = "E: 0.1 0003 002f 1\nE: 0.1 0003 0039 5\nE: 0.1 0000 0000 0\n";
            let actual = "E: 0.1 0003 0039 5\nE: 0.1 0003 002f 1\nE: 0.1 0000 0000 0\n";
            assert_eq!(check(expected, actual).verdict(), Verdict::Match);
        }

        #[test]
        fn accepts_any_permutation_of_a_frame() {
            let events = vec![
                Event::new(0.0, 3, 0x35, 1),
                Event::new(0.0, 3, 0x35, 1),
                Event::new(0.0, 3, 0x36, 2),
                Event::new(0.0, 1, 0x14a, 1),
                Event::syn_mt_report(0.0),
            ];
            let frame = Frame {
                timestamp: 0.0,
                source_line: 1,
                events: events.clone(),
            };
            let mut permutation = events;
            for _ in 0..permutation.len() {
                permutation.rotate_left(1);
                permutation.swap(0, 2);
                let permuted = Frame {
                    timestamp: 0.0,
                    source_line: 1,
                    events: permutation.clone(),
                };
                assert_eq!(compare_frame(1, &frame, &permuted), Ok(()));
            }
        }

        #[test]
        fn ignores_extra_slot_selections() {
            let frame = Frame {
                timestamp: 0.0,
                source_line: 1,
                events: vec![Event::new(0.0, 3, 0x35, 1), Event::syn_mt_report(0.0)],
            };
            let with_slots = Frame {
                timestamp: 0.0,
                source_line: 1,
                events: vec![
                    Event::slot_select(0.0, 4),
                    Event::new(0.0, 3, 0x35, 1),
                    Event::slot_select(0.0, 2),
                    Event::syn_mt_report(0.0),
                ],
            };
            assert_eq!(compare_frame(1, &frame, &with_slots), Ok(()));
            assert_eq!(compare_frame(1, &with_slots, &frame), Ok(()));
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn reports_too_few_frames() {
            let expected = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\nE: 0.2 0001 014a 0\nE: 0.2 0000 0000 0\nE: 0.3 0001 014a 1\nE: 0.3 0000 0000 0\n";
            let actual = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\nE: 0.2 0001 014a 0\nE: 0.2 0000 0000 0\n";
            let outcome = check(expected, actual);
            assert_eq!(
                outcome.failures().collect::<Vec<_>>(),
                vec![&Failure::TooFewFrames {
                    expected: 3,
                    actual: 2
                }]
            );
            assert!(outcome.diagnostics()[0].starts_with("too few events"));
        }

        #[test]
        fn reports_too_many_frames() {
            let expected = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\n";
            let actual = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\nE: 0.2 0001 014a 0\nE: 0.2 0000 0000 0\n";
            assert_eq!(
                check(expected, actual).failures().next(),
                Some(&Failure::TooManyFrames {
                    expected: 1,
                    actual: 2
                })
            );
        }

        #[test]
        fn reports_missing_events() {
            let expected = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\n";
            let actual = "E: 0.1 0001 014a 0\nE: 0.1 0000 0000 0\n";
            match check(expected, actual).failures().next() {
                Some(Failure::MissingEvent {
                    frame, line, event, ..
                }) => {
                    assert_eq!(*frame, 1);
                    assert_eq!(*line, HEADER.lines().count() + 2);
                    assert_eq!(*event, Event::new(0.0, 1, 0x14a, 1));
                }
                other => panic!("unexpected: {:?}", other),
            }
        }

        #[test]
        fn reports_event_count_differences() {
            let expected = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\n";
            let actual = "E: 0.1 0001 014a 1\nE: 0.1 0001 0145 1\nE: 0.1 0000 0000 0\n";
            match check(expected, actual).failures().next() {
                Some(Failure::EventCount {
                    expected, actual, ..
                }) => assert_eq!((*expected, *actual), (3, 4)),
                other => panic!("unexpected: {:?}", other),
            }
        }

        #[test]
        fn consumes_duplicates_one_by_one() {
            let expected = "E: 0.1 0003 0000 1\nE: 0.1 0003 0000 1\nE: 0.1 0003 0001 2\nE: 0.1 0000 0000 0\n";
            let actual = "E: 0.1 0003 0000 1\nE: 0.1 0003 0001 2\nE: 0.1 0003 0001 2\nE: 0.1 0000 0000 0\n";
            assert!(!check(expected, actual).passed());
        }

        #[test]
        fn stops_at_descriptor_mismatches() {
            let other = mk_trace("N: Touchscreen\nA: 2f 0 9 0 0 0\nE: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\n");
            let outcome = compare(&mk(TWO_CONTACTS), &other, CompareConfig::default());
            assert_eq!(outcome.failures().count(), 1);
            match outcome.failures().next() {
                Some(Failure::Descriptor { .. }) => {}
                other => panic!("unexpected: {:?}", other),
            };
        }
    }

    mod warnings {
        use super::*;

        #[test]
        fn downgrades_slot_axis_changes() {
            let expected = mk(TWO_CONTACTS);
            let actual = mk_trace(&format!(
                "{}{}",
                HEADER.replace("A: 2f 0 9", "A: 2f 0 4"),
                TWO_CONTACTS
            ));
            let outcome = compare(&expected, &actual, CompareConfig::default());
            assert_eq!(outcome.verdict(), Verdict::Warn);
        }

        #[test]
        fn downgrades_name_changes() {
            let expected = mk(TWO_CONTACTS);
            let actual = mk_trace(&format!(
                "{}{}",
                HEADER.replace("N: Touchscreen", "N: Touchscreen v2"),
                TWO_CONTACTS
            ));
            assert_eq!(
                compare(&expected, &actual, CompareConfig::default()).verdict(),
                Verdict::Warn
            );
        }

        #[test]
        fn tolerates_a_missing_property_line() {
            let expected = mk(TWO_CONTACTS);
            let actual = mk_trace(&format!("{}P: InputClassMouse\n{}", HEADER, TWO_CONTACTS));
            assert_eq!(
                compare(&expected, &actual, CompareConfig::default()).verdict(),
                Verdict::Match
            );
        }

        const SLOW: &str = "E: 0.1 0001 014a 1\nE: 0.1 0000 0000 0\nE: 0.2 0001 014a 0\nE: 0.2 0000 0000 0\nE: 0.3 0001 014a 1\nE: 0.3 0000 0000 0\n";
        const LATE: &str = "E: 1.1 0001 014a 1\nE: 1.1 0000 0000 0\nE: 1.2 0001 014a 0\nE: 1.2 0000 0000 0\nE: 1.9 0001 014a 1\nE: 1.9 0000 0000 0\n";

        #[test]
        fn reports_timing_drift() {
            let outcome = compare(
                &mk(SLOW),
                &mk(LATE),
                CompareConfig {
                    timing_tolerance: 0.05,
                },
            );
            assert!(outcome.passed());
            let warnings: Vec<&Warning> = outcome.warnings().collect();
            assert_eq!(warnings.len(), 1);
            match warnings[0] {
                Warning::TimingDrift { frame, drift, at, .. } => {
                    assert_eq!(*frame, 3);
                    assert!((drift - 0.6).abs() < 1e-9);
                    assert_eq!(*at, 1.9);
                }
                other => panic!("unexpected: {:?}", other),
            };
        }

        #[test]
        fn ignores_timing_without_a_tolerance() {
            assert_eq!(
                compare(&mk(SLOW), &mk(LATE), CompareConfig::default()).verdict(),
                Verdict::Match
            );
        }
    }
}
