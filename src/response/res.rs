use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use http::HeaderMap;

use crate::http::timing::Timings;

const RESET: &str = "\x1b[0m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_CYAN: &str = "\x1b[1;36m";
const BOLD_YELLOW: &str = "\x1b[1;33m";
const BOLD_RED: &str = "\x1b[1;31m";

/// Fully-read outcome of one request, handed to the printer and to the
/// history store.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub content_length: u64,
    pub time: Duration,
    pub timings: Timings,
}

/// Collapses repeated headers into one `; `-joined value per name.
pub fn format_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut result: HashMap<String, String> = HashMap::new();
    for (key, value) in headers {
        let text = value.to_str().unwrap_or("<binary>").to_string();
        result
            .entry(key.as_str().to_string())
            .and_modify(|joined| {
                joined.push_str("; ");
                joined.push_str(&text);
            })
            .or_insert(text);
    }
    result
}

pub fn status_color(status: u16) -> &'static str {
    match status {
        200..=299 => BOLD_GREEN,
        300..=399 => BOLD_CYAN,
        400..=499 => BOLD_YELLOW,
        _ => BOLD_RED,
    }
}

pub fn print_response(response: &HttpResponse, verbose: bool) {
    println!(
        "HTTP Status: {}{}{}",
        status_color(response.status_code),
        response.status_code,
        RESET
    );
    println!("Response Time: {:?}", response.time);
    println!("Response Size: {} bytes", response.content_length);
    print!("{}", response.timings);

    if verbose {
        println!("\nResponse Headers:");
        let mut keys: Vec<&String> = response.headers.keys().collect();
        keys.sort();
        for key in keys {
            println!("{}: {}", key, response.headers[key]);
        }
    } else if let Some(content_type) = response.headers.get("content-type") {
        println!("Content-Type: {}", content_type);
    }

    println!("\nResponse Body:");
    match pretty_json_body(response) {
        Some(pretty) => println!("{}", pretty),
        None => println!("{}", response.body),
    }
}

pub fn save_body_to_file(response: &HttpResponse, path: &str) -> Result<(), anyhow::Error> {
    std::fs::write(path, &response.body)
        .with_context(|| format!("failed to save response to file: {}", path))
}

// Pretty-print only when the server says JSON and the body actually parses.
fn pretty_json_body(response: &HttpResponse) -> Option<String> {
    let content_type = response.headers.get("content-type")?;
    if !content_type.contains("application/json") {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&response.body).ok()?;
    serde_json::to_string_pretty(&value).ok()
}
