//! makejpcom CLI: the `makejpcom` command.

mod cli;
mod output;
mod support;

use clap::Parser;
use cli::Cli;
use jpcom_engine::LocalEngine;
use jpcom_kernel::build_jpcom;

fn main() {
    let cli = Cli::parse();

    let request =
        support::build_request(&cli).unwrap_or_else(|e| output::fail(&e, None, cli.json));
    let engine = LocalEngine::with_bridge_blocks(request.layout.master, request.layout.pattern);

    match build_jpcom(&engine, &request) {
        Ok(report) => output::print_report(&report, cli.json),
        Err(e) => output::fail(&e, Some(&request.run_id), cli.json),
    }
}
