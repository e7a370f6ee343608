use evemu_compare::{compare, compare_sets, render_diff, AddMessage, CompareConfig, ErrorString, Tally, TestDatabase, Trace};
use glob::{glob, Pattern};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

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

fn write_dump(trace: &Trace, output: PathBuf) -> Result<PathBuf, ErrorString> {
    fs::write(&output, render_diff(trace)).add_message(format!("can't write {}", output.display()))?;
    info!("dumped {}", output.display());
    Ok(output)
}

/// Writes `<basename>.evd` into `output_dir`.
pub fn dump(trace: &Path, output_dir: &Path) -> Result<PathBuf, ErrorString> {
    let parsed = Trace::load(trace)?;
    write_dump(&parsed, output_dir.join(format!("{}.evd", file_name(trace))))
}

/// Returns whether `actual` passed. Dumps both traces when it didn't.
pub fn compare_traces(
    expected: &Path,
    actual: &Path,
    config: CompareConfig,
    output_dir: &Path,
) -> Result<bool, ErrorString> {
    let expected_trace = Trace::load(expected)?;
    let actual_trace = Trace::load(actual)?;
    let outcome = compare(&expected_trace, &actual_trace, config);
    for diagnostic in outcome.diagnostics() {
        println!("{}", diagnostic);
    }
    if !outcome.passed() {
        dump(expected, output_dir)?;
        dump(actual, output_dir)?;
    }
    Ok(outcome.passed())
}

/// `<stem>_<n>.ev` files recorded for one test, sorted.
fn captures_of(test: &Path, captures_dir: &Path) -> Result<Vec<PathBuf>, ErrorString> {
    let pattern = format!(
        "{}/{}_*.ev",
        Pattern::escape(&captures_dir.to_string_lossy()),
        Pattern::escape(&file_stem(test))
    );
    let mut result = vec![];
    for entry in glob(&pattern)? {
        result.push(entry?);
    }
    result.sort();
    Ok(result)
}

fn load_all(paths: &[PathBuf]) -> Result<Vec<Trace>, ErrorString> {
    paths.iter().map(|path| Trace::load(path)).collect()
}

pub struct Suite<'a> {
    pub root: &'a Path,
    pub captures: &'a Path,
    pub kernel_release: u32,
    pub config: CompareConfig,
    pub fast: bool,
    pub output_dir: &'a Path,
}

impl<'a> Suite<'a> {
    pub fn run(&self) -> Result<Tally, ErrorString> {
        let database = TestDatabase::scan(self.root, self.kernel_release, self.fast)?;
        let tests: Vec<&Path> = database.tests().collect();
        let mut tally = Tally::new(tests.len());
        for test in tests {
            if database.is_skipped(test) {
                info!("{}: skipped", test.display());
                tally.skip(test);
                continue;
            }
            let (passed, warning) = self.run_test(test, &database)?;
            tally.record(test, passed, warning);
        }
        Ok(tally)
    }

    fn run_test(&self, test: &Path, database: &TestDatabase) -> Result<(bool, bool), ErrorString> {
        let reference_paths: Vec<PathBuf> = database.expected(test).into_iter().map(Path::to_path_buf).collect();
        let capture_paths = captures_of(test, self.captures)?;
        info!(
            "testing {} against {:?}",
            test.display(),
            reference_paths
        );
        let references = load_all(&reference_paths)?;
        let captures = load_all(&capture_paths)?;
        let outcome = compare_sets(&references, &captures, self.config);
        for diagnostic in outcome.diagnostics() {
            println!("{}: {}", test.display(), diagnostic);
        }
        if !outcome.passed() {
            warn!("{}: failed", test.display());
            let stem = file_stem(test);
            for (index, capture) in captures.iter().enumerate() {
                write_dump(capture, self.output_dir.join(format!("{}_res_{}.evd", stem, index)))?;
            }
            for (index, reference) in references.iter().enumerate() {
                write_dump(reference, self.output_dir.join(format!("{}_exp_{}.evd", stem, index)))?;
            }
        }
        Ok((outcome.passed(), outcome.warning()))
    }
}
