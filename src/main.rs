use std::process::ExitCode;

fn main() -> ExitCode {
    docscribe::cli::run()
}
