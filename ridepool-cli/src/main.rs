//! Binary entry point for the `ridepool` command.

use ridepool_cli::CliError;

fn main() {
    match ridepool_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ridepool: {err}");
            std::process::exit(1);
        }
    }
}
