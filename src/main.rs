// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Teapot CLI - Composable HTTP Sessions
//!
//! Example usage and demonstration of the teapot library.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use futures::future::join_all;
use teapot::interceptor::{log_request, log_response};
use teapot::{
    logging, Configure, CookieLoader, FetchResult, Jar, JsonCookieLoader, LogConfig, Session,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let log_config = match LogConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging configuration: {}", e);
            return ExitCode::from(1);
        }
    };
    if let Err(e) = logging::init(&log_config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: teapot get <url>...");
                return ExitCode::from(1);
            }
            get_urls(&args[2..]).await
        }
        "head" => {
            if args.len() < 3 {
                eprintln!("Usage: teapot head <url>");
                return ExitCode::from(1);
            }
            head_url(&args[2]).await
        }
        "cookies" => {
            if args.len() < 4 {
                eprintln!("Usage: teapot cookies <file.json> <url> [host...]");
                return ExitCode::from(1);
            }
            fetch_with_cookies(&args[2], &args[3], &args[4..]).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("teapot {}", teapot::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Teapot - Composable HTTP Sessions

USAGE:
    teapot <COMMAND> [OPTIONS]

COMMANDS:
    get <url>...                      Fetch one or more URLs concurrently
    head <url>                        Send a HEAD request and show headers
    cookies <file> <url> [host...]    Import cookies from a JSON export, then fetch
    help                              Show this help message
    version                           Show version information

ENVIRONMENT:
    TEAPOT_LOG          Log level or filter directives (e.g. debug, teapot=trace)
    TEAPOT_LOG_FORMAT   text or json

EXAMPLES:
    teapot get https://example.com https://example.org
    teapot head https://example.com
    teapot cookies cookies.json https://example.com/account example.com
"#
    );
}

fn session() -> Session {
    Session::builder()
        .on_request(log_request())
        .on_response(log_response())
        .build()
}

fn print_result(result: &FetchResult) {
    println!("{}", result.status_message());

    if let Some(ref response) = result.response {
        println!("  Protocol: {}", response.protocol());
        println!("  Content-Type: {:?}", response.content_type());
        println!("  Size: {} bytes", result.content().len());
        println!("  Time: {}ms", response.response_time_ms);
        if response.redirected {
            println!("  Final URL: {}", response.url);
        }
    }

    if let Some(error) = result.error() {
        println!("  Error: {}", error);
    }
}

async fn get_urls(urls: &[String]) -> ExitCode {
    let base = session();

    // Clones share one client and its connection pool
    let results = join_all(urls.iter().map(|url| base.url(url).get())).await;

    let mut failed = 0;
    for result in &results {
        print_result(result);
        if !result.is_ok() {
            failed += 1;
        }
    }

    println!("\nSummary: {} fetched, {} failed", results.len(), failed);

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

async fn head_url(url: &str) -> ExitCode {
    let result = session().url(url).head().await;
    print_result(&result);

    if let Some(ref response) = result.response {
        println!("\n=== Headers ===");
        for (name, value) in response.headers.iter() {
            println!("  {}: {}", name, String::from_utf8_lossy(value.as_bytes()));
        }
    }

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

async fn fetch_with_cookies(path: &str, url: &str, hosts: &[String]) -> ExitCode {
    let jar = Arc::new(Jar::new());
    let mut loader = JsonCookieLoader::from_path(path).with_jar(jar.clone());

    if let Err(e) = loader.load(hosts).await {
        eprintln!("Failed to load cookies: {}", e);
        return ExitCode::from(1);
    }
    println!(
        "Loaded {} cookies ({} renamed)",
        jar.len(),
        jar.mapped_names()
    );

    let result = session().mutate().cookie_jar(jar).make().url(url).get().await;
    print_result(&result);

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
