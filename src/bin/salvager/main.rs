use anyhow::Result;
use clap::Parser;

mod cli;
mod cmd_hint;
mod cmd_info;
mod cmd_page;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Info { opts, json } => cmd_info::exec(opts, json),

        cli::Cmd::Page { opts, number, out } => cmd_page::exec(opts, number, out),

        cli::Cmd::Hint { opts, json } => cmd_hint::exec(opts, json),
    }
}
