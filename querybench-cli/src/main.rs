//! QueryBench command-line entry point

fn main() -> std::process::ExitCode {
    querybench_cli::main_entry()
}
