use clap::Parser;
use std::io::{BufRead, IsTerminal};
use std::sync::Arc;

use skitter::cli::Cli;
use skitter::config::CrawlOptions;
use skitter::{driver, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.debug);

    let opts = match CrawlOptions::from_cli(&cli) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("skitter: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(dir) = &opts.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("skitter: failed to create output folder {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    let targets = collect_targets(&cli);
    if targets.is_empty() {
        eprintln!("skitter: no targets; pass -s/--site, -S/--sites, or pipe domains on stdin");
        std::process::exit(1);
    }

    driver::run_all(Arc::new(opts), targets).await;
    tracing::info!("done");
}

/// Gather targets from the flag, the file, and piped stdin, in that order.
/// Blank lines are ignored.
fn collect_targets(cli: &Cli) -> Vec<String> {
    let mut targets = Vec::new();

    if let Some(site) = &cli.site {
        let site = site.trim();
        if !site.is_empty() {
            targets.push(site.to_string());
        }
    }

    if let Some(path) = &cli.sites {
        match std::fs::read_to_string(path) {
            Ok(content) => targets.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            ),
            Err(e) => {
                eprintln!("skitter: failed to read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        for line in stdin.lock().lines().map_while(Result::ok) {
            let line = line.trim();
            if !line.is_empty() {
                targets.push(line.to_string());
            }
        }
    }

    targets
}
