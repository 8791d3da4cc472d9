use std::process::ExitCode;

fn main() -> ExitCode {
    arcos_cli::init_logging();
    arcos_cli::run()
}
