//! Ask an LLM who owns each contractor, in batches.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde_json::json;
use tracing::{info, warn};

use crate::clean::{read_csv, write_csv};
use crate::records::{ContractorRow, OwnerRow};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BATCH_SIZE: usize = 50;
const BATCH_PAUSE: Duration = Duration::from_secs(3);

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```(?:json)?|```").unwrap());

pub struct EnrichOptions {
    pub model: String,
    pub batch_size: usize,
    pub pause: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            pause: BATCH_PAUSE,
        }
    }
}

/// Look up owners for every distinct contractor in `input` and write
/// `Contractor,Owner` rows to `output`. Failed batches are logged and
/// contribute no rows.
pub async fn enrich(input: &Path, output: &Path, options: &EnrichOptions) -> Result<usize> {
    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable must be set"))?;
    let client = reqwest::Client::new();

    let rows: Vec<ContractorRow> = read_csv(input)?;
    let names = distinct_contractors(&rows);
    info!("Looking up owners for {} contractors", names.len());

    let batches: Vec<&[String]> = names.chunks(options.batch_size.max(1)).collect();
    let pb = ProgressBar::new(batches.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} batches")?
            .progress_chars("=> "),
    );

    let mut owners = Vec::new();
    for (i, batch) in batches.iter().enumerate() {
        match ask_owners(&client, &api_key, &options.model, batch).await {
            Ok(text) => match parse_owner_reply(&text) {
                Ok(found) => owners.extend(found),
                Err(e) => warn!("Batch {}: output not in valid JSON format: {}", i + 1, e),
            },
            Err(e) => warn!("Batch {}: owner lookup failed: {:#}", i + 1, e),
        }
        pb.inc(1);
        if i + 1 < batches.len() {
            tokio::time::sleep(options.pause).await;
        }
    }
    pb.finish_and_clear();

    write_csv(output, &owners)?;
    Ok(owners.len())
}

/// Contractor names in first-seen order, without repeats.
pub fn distinct_contractors(rows: &[ContractorRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(r.contractor.as_str()))
        .map(|r| r.contractor.clone())
        .collect()
}

pub fn build_prompt(contractors: &[String]) -> Result<String> {
    let listed: Vec<_> = contractors.iter().map(|c| json!({ "Contractor": c })).collect();
    Ok(format!(
        "You are a factual data assistant.\n\n\
         For each construction company or contractor below, find the official owner, CEO, \
         or company head (if publicly available in the Philippines).\n\
         You may look into Department of Public Works and Highways sources. If the information \
         is not publicly verifiable, respond with \"Not found\".\n\n\
         Return the results as a valid JSON array like this:\n\
         [\n  {{\"Contractor\": \"...\", \"Owner\": \"...\"}},\n  ...\n]\n\n\
         Contractors:\n{}\n",
        serde_json::to_string_pretty(&listed)?
    ))
}

/// Drop Markdown code fences around a JSON reply and parse it.
pub fn parse_owner_reply(text: &str) -> Result<Vec<OwnerRow>, serde_json::Error> {
    let clean = FENCE_RE.replace_all(text, "");
    serde_json::from_str(clean.trim())
}

async fn ask_owners(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    contractors: &[String],
) -> Result<String> {
    let body = json!({
        "contents": [{ "parts": [{ "text": build_prompt(contractors)? }] }]
    });

    let response: serde_json::Value = client
        .post(format!("{}/{}:generateContent", GEMINI_ENDPOINT, model))
        .query(&[("key", api_key)])
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("Failed to decode model response")?;

    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No text in model response"))
}
