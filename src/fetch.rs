use crate::xml::Document;
use reqwest::Client;

/// Download and parse the supplier feed. Transport failures and non-success
/// statuses are fatal; broken markup is not (the parse is lenient).
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Document, anyhow::Error> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP {status} for {url}"));
    }
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(anyhow::anyhow!("Empty response for {url}"));
    }
    let content = String::from_utf8_lossy(&bytes);
    Ok(Document::parse_lenient(&content))
}
