#![doc = "The hashprice binary: ingests blocks, prices them, and allocates revenue per hardware profile."]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cli;
mod commands;
mod flags;
mod scheduler;

fn main() {
    use clap::Parser;

    hashprice_cli::backtrace::enable();

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
