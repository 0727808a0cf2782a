use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Context;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use url::Url;

/// Reads a JSON object of string pairs, inline or from `@file.json`.
fn read_json_map(input: &str) -> Result<HashMap<String, String>, anyhow::Error> {
    let text = if let Some(path) = input.strip_prefix('@') {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path))?
    } else {
        input.to_string()
    };
    serde_json::from_str(&text).context("invalid JSON")
}

pub fn parse_headers(input: Option<&str>) -> Result<HeaderMap, anyhow::Error> {
    let mut headers = HeaderMap::new();
    let Some(input) = input else {
        return Ok(headers);
    };
    for (key, value) in read_json_map(input).context("header parsing error")? {
        headers.insert(HeaderName::from_str(&key)?, HeaderValue::from_str(&value)?);
    }
    Ok(headers)
}

/// Query pairs sorted by key so the appended URL is deterministic.
pub fn parse_query(input: Option<&str>) -> Result<Vec<(String, String)>, anyhow::Error> {
    let Some(input) = input else {
        return Ok(Vec::new());
    };
    let mut pairs: Vec<(String, String)> = read_json_map(input)
        .context("query parsing error")?
        .into_iter()
        .collect();
    pairs.sort();
    Ok(pairs)
}

pub fn append_query(url: &str, pairs: &[(String, String)]) -> Result<Url, anyhow::Error> {
    let mut url = Url::parse(url).context("invalid URL")?;
    if !pairs.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Loads the request body (text or `@file`) and maps the body type to its
/// Content-Type. A `json` body must parse; other types pass through as-is.
pub fn parse_body(
    input: Option<&str>,
    body_type: &str,
) -> Result<(Bytes, Option<&'static str>), anyhow::Error> {
    let Some(input) = input else {
        return Ok((Bytes::new(), None));
    };
    if body_type == "none" {
        return Ok((Bytes::new(), None));
    }

    let content = if let Some(path) = input.strip_prefix('@') {
        std::fs::read(path).with_context(|| format!("Failed to read body file: {}", path))?
    } else {
        input.as_bytes().to_vec()
    };

    let content_type = match body_type {
        "json" => {
            serde_json::from_slice::<serde_json::Value>(&content).context("invalid JSON body")?;
            "application/json"
        }
        "text" => "text/plain",
        "form" => "application/x-www-form-urlencoded",
        "js" => "application/javascript",
        "html" => "text/html",
        "xml" => "application/xml",
        other => return Err(anyhow!("unsupported body type: {}", other)),
    };

    Ok((Bytes::from(content), Some(content_type)))
}
