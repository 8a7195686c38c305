use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, error, info};

use stroke_insights::config::{OutputFormat, StrokeArgs};
use stroke_insights::memory::resident_memory;
use stroke_insights::{Result, Session};

fn main() -> ExitCode {
    let args = StrokeArgs::parse();

    let env = Env::new().filter("STROKE_LOG");
    Builder::new()
        .filter(Some("stroke_insights"), args.log_level())
        .parse_env(env)
        .init();

    debug!("Arguments {:#?}", args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: StrokeArgs) -> Result<()> {
    let start_time = Instant::now();
    let start_memory = resident_memory();

    let options = args.pipeline_options();
    let session = if !args.no_prompt && io::stdin().is_terminal() {
        Session::open_with_prompt(
            args.input_source(),
            &options,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )?
    } else {
        Session::from_source(&args.input_source(), &options)?
    };

    info!(
        "Pipeline finished in {:?}, memory delta {} KiB",
        start_time.elapsed(),
        resident_memory().saturating_sub(start_memory) / 1024
    );

    if args.plan {
        println!("{}", serde_json::to_string_pretty(session.plan())?);
    }

    match (args.view, args.format) {
        (Some(view), OutputFormat::Text) => {
            println!("{}", view.render(session.raw(), session.cleaned())?)
        }
        (Some(view), OutputFormat::Json) => {
            let data = view.render(session.raw(), session.cleaned())?;
            println!("{}", serde_json::to_string_pretty(&data)?)
        }
        (None, OutputFormat::Text) => println!("{}", session.summary()),
        (None, OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&session.summary())?)
        }
    }

    Ok(())
}
