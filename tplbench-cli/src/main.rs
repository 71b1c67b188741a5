use std::process::ExitCode;

fn main() -> ExitCode {
    tplbench_cli::run()
}
