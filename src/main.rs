use std::process::ExitCode;

fn main() -> ExitCode {
    match pyc_regress::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\nERROR:\n{err:#}");
            ExitCode::FAILURE
        }
    }
}
