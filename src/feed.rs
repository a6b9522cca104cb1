use crate::category::{apply_categories, assign_category_ids};
use crate::config::{Category, Lang};
use crate::fetch::fetch_feed;
use crate::rename::{rename_ru, rename_ua};
use crate::xml::{Document, Element};
use anyhow::anyhow;
use reqwest::Client;
use std::collections::HashMap;

pub struct BuildConfig {
    pub feed_url: String,
    pub categories: Vec<Category>,
    pub category_map: HashMap<String, String>,
}

/// One full feed build for one language: fetch, transform, serialize.
/// Each language fetches its own copy of the feed.
pub async fn build_feed(
    client: &Client,
    cfg: &BuildConfig,
    lang: Lang,
) -> Result<Vec<u8>, anyhow::Error> {
    let mut doc = fetch_feed(client, &cfg.feed_url).await?;
    transform(&mut doc, cfg, lang)?;
    doc.to_bytes()
}

/// In-place document transform: enforce the category tree, assign
/// categoryId per article, rewrite names. Offer id and vendorCode pass
/// through untouched.
pub fn transform(doc: &mut Document, cfg: &BuildConfig, lang: Lang) -> Result<(), anyhow::Error> {
    let root = doc
        .root_mut()
        .ok_or_else(|| anyhow!("Feed has no root element"))?;
    let shop = root
        .child_mut("shop")
        .ok_or_else(|| anyhow!("Feed has no <shop> element"))?;

    apply_categories(shop, &cfg.categories, lang);

    let offers = shop
        .child_mut("offers")
        .ok_or_else(|| anyhow!("Feed has no <offers> element"))?;

    assign_category_ids(offers, &cfg.category_map);
    rename_offers(offers, lang);
    Ok(())
}

fn rename_offers(offers: &mut Element, lang: Lang) {
    for offer in offers.children_named_mut("offer") {
        if offer.child("name").is_none() {
            continue;
        }
        let name = offer.child_text("name");
        let desc = offer.child_text("description");
        let vendor = offer.child_text("vendor");
        let renamed = match lang {
            Lang::Ua => rename_ua(&name, &desc, &vendor),
            Lang::Ru => rename_ru(&name, &vendor),
        };
        if let Some(el) = offer.child_mut("name") {
            el.set_text(renamed);
        }
    }
}
