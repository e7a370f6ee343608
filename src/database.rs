use crate::ErrorString;
use glob::{glob, Pattern};
use log::{debug, info};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Parses the leading `<major>.<minor>` of a kernel release string into
/// `major << 16 | minor`.
pub fn kernel_release(text: &str) -> Option<u32> {
    let regex = Regex::new(r"^(\d+)\.(\d+)").ok()?;
    let captures = regex.captures(text)?;
    let major: u32 = captures[1].parse().ok()?;
    let minor: u32 = captures[2].parse().ok()?;
    Some(major << 16 | minor)
}

/// A reference trace and the kernel release it was recorded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub path: PathBuf,
    pub kernel_release: u32,
}

/// Index of the `.hid` tests below a root directory, their reference traces
/// and the tests to skip for one kernel release.
#[derive(Debug, Clone)]
pub struct TestDatabase {
    tests: BTreeMap<PathBuf, Vec<Reference>>,
    skip_markers: Vec<PathBuf>,
}

impl TestDatabase {
    pub fn scan(root: &Path, kernel_release: u32, fast: bool) -> Result<TestDatabase, ErrorString> {
        let root = Pattern::escape(&root.to_string_lossy());
        let mut paths = vec![];
        for extension in &["hid", "ev", "skip"] {
            for entry in glob(&format!("{}/**/*.{}", root, extension))? {
                paths.push(entry?);
            }
        }
        Ok(TestDatabase::from_paths(paths, kernel_release, fast))
    }

    pub fn from_paths(paths: Vec<PathBuf>, kernel_release: u32, fast: bool) -> TestDatabase {
        let mut hid_files = vec![];
        let mut skip_markers = vec![];
        let mut dumps: BTreeMap<String, Reference> = BTreeMap::new();
        for path in paths {
            match path.extension().and_then(|extension| extension.to_str()) {
                Some("hid") => hid_files.push(path),
                Some("skip") => {
                    if directory_release(&path) == Some(kernel_release) {
                        skip_markers.push(path);
                    }
                }
                Some("ev") => {
                    let release = directory_release(&path).unwrap_or_else(|| kernel_release.saturating_sub(1));
                    if release > kernel_release {
                        debug!("{}: recorded with a newer kernel, ignoring", path.display());
                        continue;
                    }
                    let basename = file_name(&path);
                    let newer = dumps
                        .get(&basename)
                        .map_or(true, |known| known.kernel_release < release);
                    if newer {
                        dumps.insert(
                            basename,
                            Reference {
                                path,
                                kernel_release: release,
                            },
                        );
                    }
                }
                _ => {}
            }
        }

        let mut tests = BTreeMap::new();
        for hid_file in hid_files {
            let stem = file_stem(&hid_file);
            let references: Vec<Reference> = dumps
                .iter()
                .filter(|(basename, _)| basename.contains(&stem))
                .map(|(_, reference)| reference.clone())
                .collect();
            if fast
                && !references.is_empty()
                && references
                    .iter()
                    .all(|reference| reference.kernel_release == kernel_release)
            {
                info!("{}: references are from the tested kernel, skipping", hid_file.display());
                skip_markers.push(hid_file.clone());
            }
            tests.insert(hid_file, references);
        }
        TestDatabase { tests, skip_markers }
    }

    /// All `.hid` tests, sorted by path.
    pub fn tests(&self) -> impl Iterator<Item = &Path> {
        self.tests.keys().map(PathBuf::as_path)
    }

    pub fn expected(&self, hid_file: &Path) -> Vec<&Path> {
        match self.tests.get(hid_file) {
            Some(references) => references.iter().map(|reference| reference.path.as_path()).collect(),
            None => vec![],
        }
    }

    pub fn references(&self, hid_file: &Path) -> &[Reference] {
        self.tests.get(hid_file).map_or(&[][..], Vec::as_slice)
    }

    pub fn is_skipped(&self, hid_file: &Path) -> bool {
        let stem = file_stem(hid_file);
        self.skip_markers
            .iter()
            .any(|marker| marker.to_string_lossy().contains(&stem))
    }

    pub fn skipped(&self) -> Vec<&Path> {
        self.tests().filter(|test| self.is_skipped(test)).collect()
    }
}

fn directory_release(path: &Path) -> Option<u32> {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|name| kernel_release(&name.to_string_lossy()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Passed,
    Warned,
    Failed,
}

/// Results of a suite run.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    total: usize,
    results: Vec<(PathBuf, Status)>,
    skipped: Vec<PathBuf>,
}

impl Tally {
    pub fn new(total: usize) -> Tally {
        Tally {
            total,
            ..Tally::default()
        }
    }

    pub fn record(&mut self, test: &Path, passed: bool, warning: bool) {
        let status = match (passed, warning) {
            (false, _) => Status::Failed,
            (true, true) => Status::Warned,
            (true, false) => Status::Passed,
        };
        self.results.push((test.to_path_buf(), status));
    }

    pub fn skip(&mut self, test: &Path) {
        self.skipped.push(test.to_path_buf());
    }

    fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|(_, result)| *result == status).count()
    }

    pub fn failed(&self) -> bool {
        self.count(Status::Failed) > 0
    }

    fn with_status(&self, status: Status) -> Vec<&Path> {
        self.results
            .iter()
            .filter(|(_, result)| *result == status)
            .map(|(test, _)| test.as_path())
            .collect()
    }

    /// Lists every test under its category (`SK`, `OK`, `WW`, `EE`),
    /// followed by the summary line.
    pub fn report(&self) -> String {
        let sections = vec![
            ("tests skipped (SK)", "SK", self.skipped.iter().map(PathBuf::as_path).collect::<Vec<_>>()),
            ("tests passed (OK)", "OK", self.with_status(Status::Passed)),
            ("tests passed with warnings (WW)", "WW", self.with_status(Status::Warned)),
            ("tests failed (EE)", "EE", self.with_status(Status::Failed)),
        ];
        let mut output = String::new();
        for (title, tag, tests) in sections {
            if tests.is_empty() {
                continue;
            }
            output.push_str(&format!("{}:\n", title));
            for test in tests {
                output.push_str(&format!("{}: {}\n", tag, test.display()));
            }
        }
        output.push_str(&format!("{}\n", self));
        output
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let warnings = self.count(Status::Warned);
        let good = self.count(Status::Passed) + warnings;
        let errors = self.count(Status::Failed);
        let skipped = self.skipped.len();
        write!(
            f,
            "{} / {} tests run, {} / {} passed",
            good + errors + skipped,
            self.total,
            good,
            good + errors
        )?;
        let mut parts = vec![];
        if warnings > 0 {
            parts.push(format!("{} warnings", warnings));
        }
        if errors > 0 {
            parts.push(format!("{} errors", errors));
        }
        if skipped > 0 {
            parts.push(format!("{} skipped", skipped));
        }
        match parts.split_last() {
            None => Ok(()),
            Some((last, [])) => write!(f, " ({})", last),
            Some((last, init)) => write!(f, " ({} and {})", init.join(", "), last),
        }
    }
}
