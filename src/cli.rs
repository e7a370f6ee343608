use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use evemu_compare::{kernel_release, CompareConfig, ErrorString};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dump {
        trace: PathBuf,
    },
    Compare {
        expected: PathBuf,
        actual: PathBuf,
        config: CompareConfig,
    },
    Suite {
        root: PathBuf,
        captures: PathBuf,
        kernel_release: u32,
        config: CompareConfig,
        fast: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub output_dir: PathBuf,
    pub verbosity: u64,
    pub command: Command,
}

pub fn parse<'a, 'b>(app: App<'a, 'b>) -> Result<Args, ErrorString> {
    from_matches(&build(app).get_matches())
}

fn delta_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("delta")
        .long("delta")
        .value_name("SECONDS")
        .help("Warns when inter-frame delays differ by more than this (default: 0, disabled)")
        .takes_value(true)
}

fn build<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.version("0.1.0")
        .about("compares evemu event traces of input devices")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("output-dir")
                .long("output-dir")
                .value_name("DIR")
                .help("Where .evd dumps are written (default: .)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Logs more, repeat for debug output"),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("writes an annotated dump of a trace")
                .arg(Arg::with_name("TRACE").required(true)),
        )
        .subcommand(
            SubCommand::with_name("compare")
                .about("checks a trace against a reference trace")
                .arg(Arg::with_name("EXPECTED").required(true))
                .arg(Arg::with_name("ACTUAL").required(true))
                .arg(delta_arg()),
        )
        .subcommand(
            SubCommand::with_name("suite")
                .about("checks the captures of all tests below ROOT")
                .arg(Arg::with_name("ROOT").required(true))
                .arg(
                    Arg::with_name("captures")
                        .long("captures")
                        .value_name("DIR")
                        .help("Directory holding the <test>_<n>.ev captures")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("kernel")
                        .long("kernel")
                        .value_name("RELEASE")
                        .help("Release of the kernel under test, e.g. 3.10.0")
                        .takes_value(true)
                        .required(true),
                )
                .arg(delta_arg())
                .arg(
                    Arg::with_name("fast")
                        .long("fast")
                        .help("Skips tests recorded on the kernel under test (default: false)")
                        .takes_value(false),
                ),
        )
}

fn from_matches(matches: &ArgMatches) -> Result<Args, ErrorString> {
    let command = match matches.subcommand() {
        ("dump", Some(matches)) => Command::Dump {
            trace: path(matches, "TRACE")?,
        },
        ("compare", Some(matches)) => Command::Compare {
            expected: path(matches, "EXPECTED")?,
            actual: path(matches, "ACTUAL")?,
            config: parse_config(matches)?,
        },
        ("suite", Some(matches)) => Command::Suite {
            root: path(matches, "ROOT")?,
            captures: path(matches, "captures")?,
            kernel_release: parse_kernel_release(matches.value_of("kernel"))?,
            config: parse_config(matches)?,
            fast: matches.is_present("fast"),
        },
        (name, _) => return Err(ErrorString(format!("unknown command: {}", name))),
    };
    Ok(Args {
        output_dir: PathBuf::from(matches.value_of("output-dir").unwrap_or(".")),
        verbosity: matches.occurrences_of("verbose"),
        command,
    })
}

fn path(matches: &ArgMatches, name: &str) -> Result<PathBuf, ErrorString> {
    matches
        .value_of(name)
        .map(PathBuf::from)
        .ok_or_else(|| ErrorString(format!("missing argument: {}", name)))
}

fn parse_config(matches: &ArgMatches) -> Result<CompareConfig, ErrorString> {
    let timing_tolerance: f64 = parse_with_default(matches.value_of("delta"), 0.0)?;
    if timing_tolerance < 0.0 {
        return Err(ErrorString(format!("negative delta: {}", timing_tolerance)));
    }
    Ok(CompareConfig { timing_tolerance })
}

fn parse_with_default<N>(input: Option<&str>, default: N) -> Result<N, ErrorString>
where
    N: FromStr,
    <N as FromStr>::Err: Display,
{
    match input {
        None => Ok(default),
        Some(string) => string
            .parse()
            .map_err(|e| ErrorString::from(format!("{}: {}", string, e))),
    }
}

fn parse_kernel_release(input: Option<&str>) -> Result<u32, ErrorString> {
    match input {
        None => Err(ErrorString::from("missing kernel release")),
        Some(release) => kernel_release(release)
            .ok_or_else(|| ErrorString(format!("invalid kernel release: {}, expected <major>.<minor>", release))),
    }
}
