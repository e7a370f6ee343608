use crate::compare::{compare, CompareConfig};
use crate::descriptor::match_descriptor;
use crate::outcome::{Failure, Outcome};
use crate::trace::Trace;
use log::info;

/// What happened to one captured trace of a set.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub index: usize,
    /// Index of the reference trace the capture was paired with.
    pub reference: Option<usize>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOutcome {
    pub captures: Vec<CaptureOutcome>,
    /// Failure of the set as a whole, independent of single captures.
    pub failure: Option<Failure>,
}

impl SetOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.captures.iter().all(|capture| capture.outcome.passed())
    }

    pub fn warning(&self) -> bool {
        self.captures.iter().any(|capture| capture.outcome.warning())
    }

    /// Diagnostics of all captures, each prefixed with `output #<i>: ` when
    /// there is more than one.
    pub fn diagnostics(&self) -> Vec<String> {
        let prefixed = self.captures.len() > 1;
        let mut result = vec![];
        for capture in &self.captures {
            for diagnostic in capture.outcome.diagnostics() {
                if prefixed {
                    result.push(format!("output #{}: {}", capture.index, diagnostic));
                } else {
                    result.push(diagnostic);
                }
            }
        }
        if let Some(failure) = &self.failure {
            result.push(failure.to_string());
        }
        result
    }
}

/// Pairs every capture with the first reference whose descriptor matches and
/// compares the two. Unmatched captures only fail the set when they produced
/// frames.
pub fn compare_sets(references: &[Trace], captures: &[Trace], config: CompareConfig) -> SetOutcome {
    if references.is_empty() {
        return SetOutcome {
            captures: vec![],
            failure: Some(Failure::NoReference),
        };
    }
    let mut result = SetOutcome::default();
    for (index, capture) in captures.iter().enumerate() {
        let reference = references
            .iter()
            .position(|reference| match_descriptor(&reference.descriptor, &capture.descriptor).matches());
        let outcome = match reference {
            Some(reference) => {
                info!("output #{}: paired with reference #{}", index, reference);
                compare(&references[reference], capture, config)
            }
            None => unmatched(capture),
        };
        result.captures.push(CaptureOutcome {
            index,
            reference,
            outcome,
        });
    }
    if result.captures.iter().all(|capture| capture.reference.is_none()) {
        result.failure = Some(Failure::NothingMatched);
    }
    result
}

fn unmatched(capture: &Trace) -> Outcome {
    let mut outcome = Outcome::default();
    if capture.frames.is_empty() {
        info!("ignoring a capture without events and without a matching reference");
        outcome.note("no matching device, no events received -> ignoring".to_string());
    } else {
        outcome.fail(Failure::UnmatchedDevice {
            frames: capture.frames.len(),
        });
    }
    outcome
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trace::test::mk_trace;
    use std::thread;

    const TOUCHSCREEN: &str = "# EVEMU 1.2
N: Touchscreen
A: 2f 0 9 0 0 0
A: 39 0 65535 0 0 0
E: 0.1 0003 002f 0
E: 0.1 0003 0039 5
E: 0.1 0000 0000 0
E: 0.2 0003 0039 -1
E: 0.2 0000 0000 0
";

    const MOUSE: &str = "# EVEMU 1.2
N: Mouse
E: 0.1 0001 0110 1
E: 0.1 0000 0000 0
";

    const SILENT_MOUSE: &str = "# EVEMU 1.2\nN: Mouse\n";

    fn mk_set(texts: &[&str]) -> Vec<Trace> {
        texts.iter().map(|text| mk_trace(text)).collect()
    }

    #[test]
    fn pairs_captures_with_matching_references() {
        let references = mk_set(&[MOUSE, TOUCHSCREEN]);
        let result = compare_sets(&references, &mk_set(&[TOUCHSCREEN, MOUSE]), CompareConfig::default());
        assert!(result.passed());
        assert!(!result.warning());
        let paired: Vec<Option<usize>> = result.captures.iter().map(|capture| capture.reference).collect();
        assert_eq!(paired, vec![Some(1), Some(0)]);
    }

    #[test]
    fn fails_without_references() {
        let result = compare_sets(&[], &mk_set(&[MOUSE]), CompareConfig::default());
        assert!(!result.passed());
        assert_eq!(result.failure, Some(Failure::NoReference));
    }

    mod unmatched_captures {
        use super::*;

        #[test]
        fn ignores_silent_ones() {
            let result = compare_sets(
                &mk_set(&[TOUCHSCREEN]),
                &mk_set(&[TOUCHSCREEN, SILENT_MOUSE]),
                CompareConfig::default(),
            );
            assert!(result.passed());
            assert!(!result.warning());
            assert_eq!(
                result.diagnostics(),
                vec!["output #1: no matching device, no events received -> ignoring".to_string()]
            );
        }

        #[test]
        fn fail_when_they_produced_events() {
            let result = compare_sets(
                &mk_set(&[TOUCHSCREEN]),
                &mk_set(&[TOUCHSCREEN, MOUSE]),
                CompareConfig::default(),
            );
            assert!(!result.passed());
            assert_eq!(
                result.captures[1].outcome.failures().next(),
                Some(&Failure::UnmatchedDevice { frames: 1 })
            );
        }

        #[test]
        fn fail_the_set_when_nothing_matched() {
            let result = compare_sets(&mk_set(&[TOUCHSCREEN]), &mk_set(&[SILENT_MOUSE]), CompareConfig::default());
            assert!(!result.passed());
            assert_eq!(result.failure, Some(Failure::NothingMatched));
        }
    }

    mod aggregation {
        use super::*;

        #[test]
        fn any_failure_fails_the_set() {
            let broken = TOUCHSCREEN.replace("0039 -1", "0039 7");
            let result = compare_sets(
                &mk_set(&[TOUCHSCREEN, MOUSE]),
                &mk_set(&[MOUSE, broken.as_str()]),
                CompareConfig::default(),
            );
            assert!(!result.passed());
            assert!(result.captures[0].outcome.passed());
            assert!(!result.captures[1].outcome.passed());
            assert!(result.diagnostics()[0].starts_with("output #1: line "));
        }

        #[test]
        fn warnings_bubble_up() {
            let renamed = TOUCHSCREEN.replace("N: Touchscreen", "N: Touchscreen v2");
            let result = compare_sets(&mk_set(&[TOUCHSCREEN]), &mk_set(&[renamed.as_str()]), CompareConfig::default());
            assert!(result.passed());
            assert!(result.warning());
        }

        #[test]
        fn a_single_capture_has_no_prefix() {
            let renamed = TOUCHSCREEN.replace("N: Touchscreen", "N: Touchscreen v2");
            let result = compare_sets(&mk_set(&[TOUCHSCREEN]), &mk_set(&[renamed.as_str()]), CompareConfig::default());
            assert!(result.diagnostics()[0].starts_with("device name changed"));
        }
    }

    mod thread_behavior {
        use super::*;

        fn run_in_thread<F, T>(action: F) -> T
        where
            T: Send + 'static,
            F: FnOnce() -> T + Send + 'static,
        {
            thread::spawn(action).join().unwrap()
        }

        #[test]
        fn comparisons_can_run_in_parallel() {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    thread::spawn(|| {
                        compare_sets(&mk_set(&[TOUCHSCREEN]), &mk_set(&[TOUCHSCREEN]), CompareConfig::default())
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().passed());
            }
        }

        #[test]
        fn traces_can_be_moved_to_other_threads() {
            let references = mk_set(&[TOUCHSCREEN]);
            let captures = mk_set(&[TOUCHSCREEN]);
            let result = run_in_thread(move || compare_sets(&references, &captures, CompareConfig::default()));
            assert!(result.passed());
        }
    }
}
