use std::process::ExitCode;

use rsmonkey::repl::Session;

fn main() -> ExitCode {
    let mut session = match Session::new() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = session.run_prompt(stdin.lock(), stdout.lock()) {
        eprintln!("Failed read line: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
