use anyhow::Context;
use fitdrip_feed::config::{load_categories, load_category_map};
use fitdrip_feed::feed::{build_feed, BuildConfig};
use fitdrip_feed::Lang;
use reqwest::Client;
use std::env;
use std::time::Duration;

const DSN_URL: &str = "https://dsn.com.ua/content/export/02f6f031be3bbbdac0097758e1aa8dc6.xml";

const CATEGORIES_JSON: &str = "tools/categories.json";
const CATEGORY_MAP_JSON: &str = "tools/category_map.json";

const OUT_DIR: &str = "docs";
const OUT_UA: &str = "docs/fitdrip_ua.xml";
const OUT_RU: &str = "docs/fitdrip_ru.xml";

const FETCH_TIMEOUT: Duration = Duration::from_secs(180);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    let categories = load_categories(CATEGORIES_JSON).await?;
    let category_map = load_category_map(CATEGORY_MAP_JSON).await?;
    log::info!(
        "Loaded {} categories, {} mapped articles",
        categories.len(),
        category_map.len()
    );

    let cfg = BuildConfig {
        feed_url: DSN_URL.to_string(),
        categories,
        category_map,
    };
    let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;

    tokio::fs::create_dir_all(OUT_DIR).await?;
    for (lang, out_path) in [(Lang::Ua, OUT_UA), (Lang::Ru, OUT_RU)] {
        let xml = build_feed(&client, &cfg, lang).await?;
        // Written only after the whole build succeeded; a failed run leaves
        // the previous file in place.
        tokio::fs::write(out_path, xml)
            .await
            .with_context(|| format!("Unable to write {out_path}"))?;
        log::info!("Feed written to {out_path}");
    }
    Ok(())
}
