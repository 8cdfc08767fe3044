//! dcx - command-line front end for the design bitmap codec

use std::process::ExitCode;

use design_codec::cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run()
}
