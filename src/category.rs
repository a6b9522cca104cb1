use crate::config::{Category, Lang};
use crate::xml::Element;
use std::collections::HashMap;

/// Replace the feed's `<categories>` with the shop's own tree. Full replace:
/// supplier categories are discarded no matter what they contain.
pub fn apply_categories(shop: &mut Element, categories: &[Category], lang: Lang) {
    shop.remove_children("categories");
    let mut cats = Element::new("categories");
    for category in categories {
        let mut el = Element::new("category");
        el.attrs.push(("id".to_string(), category.id.clone()));
        if let Some(parent_id) = &category.parent_id {
            el.attrs.push(("parentId".to_string(), parent_id.clone()));
        }
        el.set_text(category.label(lang));
        cats.push_element(el);
    }
    shop.push_element(cats);
}

/// Assign `<categoryId>` by vendorCode (article). Offers without a vendor
/// code or without a mapping keep whatever categoryId they already have;
/// the category is never guessed from the brand. Offer id and vendorCode
/// are never written to.
pub fn assign_category_ids(offers: &mut Element, map: &HashMap<String, String>) {
    for offer in offers.children_named_mut("offer") {
        let vendor_code = offer.child_text("vendorCode");
        let vendor_code = vendor_code.trim();
        if vendor_code.is_empty() {
            continue;
        }
        let Some(category_id) = map.get(vendor_code) else {
            continue;
        };
        match offer.child_mut("categoryId") {
            Some(el) => el.set_text(category_id.clone()),
            None => {
                let mut el = Element::new("categoryId");
                el.set_text(category_id.clone());
                offer.push_element(el);
            }
        }
    }
}
