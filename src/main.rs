use std::io::{self, Write};
use std::process::ExitCode;

use docmd::cli;
use docmd::config::Config;

fn init_logging(config: &Config) {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_max_level(config.log_level)
        .try_init();

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("{info}");
    }));
}

fn main() -> ExitCode {
    let config = Config::from_env();
    init_logging(&config);
    config.report_issues();

    let outcome = cli::run(std::env::args_os(), &config);

    let document = match outcome.render() {
        Ok(document) => document,
        Err(e) => {
            tracing::error!("failed to serialize report: {e}");
            return ExitCode::from(1);
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{document}").and_then(|()| stdout.flush()) {
        tracing::error!("stdout: {e}");
        return ExitCode::from(1);
    }

    ExitCode::from(outcome.exit_code)
}
