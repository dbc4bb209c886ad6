use std::process::ExitCode;

#[expect(
    clippy::print_stderr,
    reason = "telemetry may be unavailable when launch fails"
)]
fn main() -> ExitCode {
    match dendend::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("dendend: {error}");
            ExitCode::FAILURE
        }
    }
}
