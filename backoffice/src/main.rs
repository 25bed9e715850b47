use backoffice::config::CliArgs;
use backoffice::error::ErrorInfo;
use backoffice::run::run_command;
use clap::Parser;
use snafu::ErrorCompat;
use std::process;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run_command(args).await {
        eprintln!("Application error: {}", ErrorInfo::from(&e));
        if e.requires_login() {
            eprintln!("Run `backoffice login` to sign in again.");
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            println!("{}", bt);
        }
        process::exit(1);
    }
}
