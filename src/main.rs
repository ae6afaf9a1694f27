use std::process;

use anyhow;
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use dcrdm::interfaces::cli::{log_heading, Cli};
use dcrdm::interfaces::input::Input;
use dcrdm::interfaces::InputHandle;
use dcrdm::io::read_dcrdm_yaml;

/// Routes the `dcrdm-output` logger to the console, or to a file if one is given, and everything
/// else at warning level or above to standard error.
fn configure_logging(cli: &Cli) -> Result<log4rs::Handle, anyhow::Error> {
    let output_encoder = || Box::new(PatternEncoder::new("{m}{n}"));
    let output: Box<dyn Append> = if let Some(path) = cli.output.as_ref() {
        Box::new(
            FileAppender::builder()
                .encoder(output_encoder())
                .append(false)
                .build(path)?,
        )
    } else {
        Box::new(ConsoleAppender::builder().encoder(output_encoder()).build())
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {t}: {m}{n}")))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("output", output))
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .logger(
            Logger::builder()
                .appender("output")
                .additive(false)
                .build("dcrdm-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    Ok(log4rs::init_config(config)?)
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = configure_logging(&cli) {
        eprintln!("Unable to configure logging: {err:#}");
        process::exit(1);
    }

    log_heading();
    let input = match read_dcrdm_yaml::<Input, _>(&cli.config) {
        Ok(input) => input,
        Err(err) => {
            log::error!("Unable to read `{}`: {err:#}", cli.config.display());
            process::exit(1);
        }
    };
    if input.handle().is_err() {
        process::exit(1);
    }
}
