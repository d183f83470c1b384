use std::process::ExitCode;

use loandesk_lib::config::Config;

fn main() -> ExitCode {
    loandesk_lib::init_tracing();

    let config = Config::from_env();
    match loandesk_lib::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
