// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Build the Config and load the wordlist (fatal if either is missing)
// 3. Run the scan in the requested mode (plain, extensions, recursive)
// 4. Print the table, save text/JSON files if asked, print statistics
// 5. Exit with proper code (0 = scan completed, 1 = error)
//
// Rust concepts used:
// - async/await: Because we need to make many network requests concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;       // src/cli.rs - command-line parsing
mod crawl;     // src/crawl/ - recursive scanning through redirects
mod logging;   // src/logging.rs - tracing setup
mod output;    // src/output.rs - table, text and JSON output
mod probe;     // src/probe/ - HTTP client, rate limiter, smart filter
mod scanner;   // src/scanner/ - the worker pool and scan orchestration
mod wordlist;  // src/wordlist.rs - wordlist loading

#[cfg(test)]
mod testing;   // src/testing.rs - scripted HTTP server for tests

use anyhow::Result;
use clap::Parser; // Parser trait enables the parse() method
use tracing::{error, info};

use cli::Cli;
use scanner::{expand_words, Scanner};

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(logging::level_from_cli(&cli))?;

    // Config problems stop us before a single request is sent
    let config = cli.to_config()?;
    let words = wordlist::load(cli.wordlist_path()?).await?;

    print_banner();
    info!("Loaded {} words", words.len());
    info!("Target: {}", config.base_url);
    info!("Threads: {}", config.threads);

    let scanner = Scanner::new(config)?;
    let config = scanner.config();

    let results = if config.recursive {
        // Extensions (if any) apply at every level of the crawl
        let words = expand_words(&words, &config.extensions);
        scanner.scan_recursive(&words, config.max_depth).await
    } else if !config.extensions.is_empty() {
        scanner.scan_with_extensions(&words, &config.extensions).await
    } else {
        scanner.scan(&words).await
    };

    output::print_results(&results);

    // Failing to save is reported but doesn't fail the run
    if let Some(path) = &cli.output {
        match output::save_text(&results, path) {
            Ok(()) => info!("Results saved to {}", path.display()),
            Err(e) => error!("Error saving results: {:#}", e),
        }
    }

    if let Some(path) = &cli.json {
        match output::save_json(&results, path) {
            Ok(()) => info!("JSON saved to {}", path.display()),
            Err(e) => error!("Error saving JSON: {:#}", e),
        }
    }

    let reported = scanner.all_results().await;
    info!("{} path(s) reported during this run", reported.len());
    output::print_stats(&scanner.stats().await);
    Ok(0)
}

fn print_banner() {
    println!("dirprobe v{} - hidden path discovery", env!("CARGO_PKG_VERSION"));
    println!("{}", "=".repeat(40));
}
