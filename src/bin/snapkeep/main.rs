use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_create;
mod cmd_list;
mod cmd_restore;
mod cmd_delete;
mod cmd_export;
mod cmd_import;
mod cmd_stats;
mod cmd_check;
mod cmd_cleanup;
mod cmd_watch;

fn init_logger() {
    // RUST_LOG overrides, default is info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Create { store, description } =>
            cmd_create::exec(store, description),

        cli::Cmd::Capture { store, tier } =>
            cmd_create::exec_tier(store, tier),

        cli::Cmd::List { store, tier, json } =>
            cmd_list::exec(store, tier, json),

        cli::Cmd::Restore { store, key } =>
            cmd_restore::exec(store, key),

        cli::Cmd::Delete { store, key } =>
            cmd_delete::exec(store, key),

        cli::Cmd::Export { store, key, out } =>
            cmd_export::exec(store, key, out),

        cli::Cmd::Import { store, file } =>
            cmd_import::exec(store, file),

        cli::Cmd::Stats { store, json } =>
            cmd_stats::exec(store, json),

        cli::Cmd::Check { store, json } =>
            cmd_check::exec(store, json),

        cli::Cmd::Cleanup { store } =>
            cmd_cleanup::exec(store),

        cli::Cmd::Watch { store, seconds } =>
            cmd_watch::exec(store, seconds),
    }
}
