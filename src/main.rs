mod cli;
mod commands;
mod logging;

use cli::Command;
use commands::Suite;
use evemu_compare::ErrorString;
use std::process;

fn main() -> Result<(), ErrorString> {
    let args = cli::parse(clap::App::new("evemu-compare"))?;
    logging::init(args.verbosity);
    let passed = match args.command {
        Command::Dump { trace } => {
            let output = commands::dump(&trace, &args.output_dir)?;
            println!("dumping output in: {}", output.display());
            true
        }
        Command::Compare {
            expected,
            actual,
            config,
        } => commands::compare_traces(&expected, &actual, config, &args.output_dir)?,
        Command::Suite {
            root,
            captures,
            kernel_release,
            config,
            fast,
        } => {
            let tally = Suite {
                root: &root,
                captures: &captures,
                kernel_release,
                config,
                fast,
                output_dir: &args.output_dir,
            }
            .run()?;
            print!("{}", tally.report());
            !tally.failed()
        }
    };
    if !passed {
        process::exit(1);
    }
    Ok(())
}
