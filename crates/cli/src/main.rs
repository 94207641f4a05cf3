use std::process::ExitCode;

fn main() -> ExitCode {
    funda_cli::run()
}
