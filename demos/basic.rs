use admin_fetch::{retry, Fetcher, RequestInit, RetryOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("ADMIN_BASE_URL")?;
    let token = std::env::var("ADMIN_TOKEN")?;

    let fetcher = Fetcher::new();
    let url = format!("{}/admin/realms", base_url.trim_end_matches('/'));

    let response = retry(
        || {
            fetcher.fetch_with_error(url.as_str(), Some(RequestInit::new().with_bearer(&token)))
        },
        RetryOptions::default(),
    )
    .await?;

    let realms: serde_json::Value = response.json().await?;
    println!("{realms:#}");

    Ok(())
}
