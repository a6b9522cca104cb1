use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_aux::field_attributes::deserialize_string_from_number;
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lang {
    Ua,
    Ru,
}

/// One record of the shop's own category tree. The tree is authoritative:
/// whatever categories the supplier feed carries get thrown away.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    #[serde(
        rename = "parentId",
        default,
        deserialize_with = "empty_id_as_none"
    )]
    pub parent_id: Option<String>,
    pub ua: String,
    pub ru: String,
}

impl Category {
    pub fn label(&self, lang: Lang) -> &str {
        match lang {
            Lang::Ua => &self.ua,
            Lang::Ru => &self.ru,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategoriesFile {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct CategoryMapFile {
    #[serde(default)]
    map: HashMap<String, serde_json::Value>,
}

pub async fn load_categories(path: impl AsRef<Path>) -> Result<Vec<Category>, anyhow::Error> {
    let path = path.as_ref();
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Unable to read categories config {}", path.display()))?;
    let file: CategoriesFile = serde_json::from_str(&data)
        .with_context(|| format!("Unable to parse categories config {}", path.display()))?;
    Ok(file.categories)
}

/// vendorCode → categoryId. Ids may be JSON numbers or strings; entries with
/// an empty id mean "no mapping" and are dropped here.
pub async fn load_category_map(
    path: impl AsRef<Path>,
) -> Result<HashMap<String, String>, anyhow::Error> {
    let path = path.as_ref();
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Unable to read category map {}", path.display()))?;
    let file: CategoryMapFile = serde_json::from_str(&data)
        .with_context(|| format!("Unable to parse category map {}", path.display()))?;
    Ok(file
        .map
        .into_iter()
        .filter_map(|(code, id)| Some((code, id_as_string(&id)?)))
        .collect())
}

fn id_as_string(value: &serde_json::Value) -> Option<String> {
    let id = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn empty_id_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(id_as_string))
}
