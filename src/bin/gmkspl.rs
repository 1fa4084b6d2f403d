use clap::Parser;
use std::process;

use nuevgen::make_splines::{self, MakeSplinesArgs, USAGE};
use nuevgen::{JobEnvSnapshot, RunConfig};

fn fatal(message: impl std::fmt::Display, code: i32) -> ! {
    log::error!("{}", message);
    log::info!("Syntax:\n   {}", USAGE);
    process::exit(code);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = match MakeSplinesArgs::try_parse() {
        Ok(args) => args,
        // --help and friends
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => fatal(e.to_string().trim_end(), 1),
    };

    JobEnvSnapshot::take().log();

    let config = RunConfig::from_env().unwrap_or_else(|e| fatal(&e, e.exit_code()));
    let options = args
        .resolve(&config.generator_list)
        .unwrap_or_else(|e| fatal(&e, e.exit_code()));

    log::info!("Neutrino PDG codes  = {:?}", options.neutrinos);
    log::info!("Targets             = {:?}", options.targets);
    log::info!("Output XML file     = {}", options.output.display());

    match make_splines::run(&options, &config) {
        Ok(summary) => {
            if !summary.failures.is_empty() {
                log::warn!(
                    "{} channels could not be built and are missing from {}",
                    summary.failures.len(),
                    options.output.display()
                );
            }
        }
        Err(e) => fatal(&e, e.exit_code()),
    }
}
