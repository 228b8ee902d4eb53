//! fraudcheck binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match fraudcheck::cli::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
