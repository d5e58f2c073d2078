use std::process::ExitCode;

fn main() -> ExitCode {
    match slnbuild::run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
