use itertools::Itertools;
use lazy_regex::{lazy_regex, regex, Lazy};
use regex::Regex;

/// Title rewriting for the built feeds.
///
/// UA and RU are deliberately separate rule sets: UA gets the full chain
/// (phrase overrides, keyword type inference, purpose extraction, brand
/// suffix), RU only base normalization and brand suffix. Keep them apart,
/// merging them would silently change RU output.

static ANIMAL_FLEX: Lazy<Regex> = lazy_regex!(r"(?i)\banimal flex\b");
static ANIMAL_PAK: Lazy<Regex> = lazy_regex!(r"(?i)\banimal pak\b");

/// Known product lines whose titles always get the same fixed descriptor.
/// Whole-word, case-insensitive.
static PHRASE_OVERRIDES_UA: [(&Lazy<Regex>, &str); 2] = [
    (&ANIMAL_FLEX, "комплекс для суглобів та зв'язок"),
    (&ANIMAL_PAK, "вітамінно-мінеральний комплекс"),
];

/// Ordered keyword → UA type label table, first match wins. Matching is
/// case-insensitive substring over the normalized base name. New product
/// types are added here, not as code.
const KEYWORD_TYPES_UA: &[(&[&str], &str)] = &[
    (&["creatine", "креатин"], "креатин моногідрат"),
    (&["whey", "protein", "протеїн", "протеин", "izolat", "isolate"], "сироватковий протеїн"),
    (&["bcaa", "бцаа", "amino", "аміно", "амино", "eaa"], "амінокислотний комплекс"),
    (&["gainer", "гейнер", "mass "], "гейнер для набору маси"),
    (&["glutamine", "глютамін", "глютамин"], "глютамін"),
    (&["collagen", "колаген", "коллаген"], "колаген для суглобів"),
    (&["omega", "омега", "fish oil"], "омега-3 жирні кислоти"),
    (&["carnitine", "карнітин", "карнитин"], "L-карнітин"),
    (&["pre-workout", "pre workout", "предтрен", "передтрен"], "передтренувальний комплекс"),
    (&["vitamin", "вітамін", "витамин", "multi"], "вітамінно-мінеральний комплекс"),
];

/// Trailing-token strip: quantities with a unit word, e.g. "500g", "300 г",
/// "120 caps", "0.5 л", "90 капсул". Applied repeatedly from the tail.
fn strip_units(name: &str) -> String {
    let re = regex!(
        r"(?i)(\s+№?\d+([.,]\d+)?\s*(г|кг|мг|мл|л|гр|g|kg|mg|ml|l|caps?|капс\w*|таб\w*|tabs?|порц\w*|servings?|шт)\.?)+\s*$"
    );
    re.replace(name, "").into_owned()
}

fn collapse_whitespace(s: &str) -> String {
    regex!(r"\s+").replace_all(s.trim(), " ").into_owned()
}

fn normalize_base(name: &str) -> String {
    strip_units(&collapse_whitespace(name))
}

/// The name already states a type or purpose ("Base — type", "Base: type").
fn already_typed(name: &str) -> bool {
    name.contains('—') || name.contains(':')
}

fn with_brand(base: &str, brand: &str) -> String {
    let brand = brand.trim();
    if brand.is_empty() || base.to_lowercase().contains(&brand.to_lowercase()) {
        base.to_string()
    } else {
        format!("{base} {brand}")
    }
}

/// Cut the description down to the part that talks about the product:
/// collapse whitespace and drop everything from the first label word on.
fn clean_desc(desc: &str) -> String {
    let d = collapse_whitespace(desc);
    let re = regex!(r"(Штрихкод|Артикул|SKU|Код|Виробник|Производитель)\b");
    match re.find(&d) {
        Some(m) => d[..m.start()].trim().to_string(),
        None => d,
    }
}

/// Pull a short purpose phrase out of the description: a "для ..." clause
/// first, the opening words otherwise. The 10-90 char bound and the 8-word
/// fallback are kept from the previous builder for output compatibility.
fn extract_purpose(desc: &str) -> String {
    let d = clean_desc(desc);
    if d.is_empty() {
        return String::new();
    }
    let purpose = match regex!(r"(?i)(для\s+[^.!?]{10,90})").captures(&d) {
        Some(c) => c[1].to_string(),
        None => d.split_whitespace().take(8).join(" "),
    };
    purpose
        .trim_matches(&[' ', '-', '–', '—', ':', ';', ',', '.'][..])
        .to_string()
}

pub fn rename_ua(name: &str, desc: &str, vendor: &str) -> String {
    let base = normalize_base(name);

    if !already_typed(&base) {
        for (re, descriptor) in &PHRASE_OVERRIDES_UA {
            if re.is_match(&base) {
                return format!("{} — {descriptor}", with_brand(&base, vendor));
            }
        }

        let lower = base.to_lowercase();
        for (keywords, label) in KEYWORD_TYPES_UA {
            if keywords.iter().any(|k| lower.contains(k)) {
                return format!("{} — {label}", with_brand(&base, vendor));
            }
        }

        let purpose = extract_purpose(desc);
        if !purpose.is_empty() {
            return format!("{} — {purpose}", with_brand(&base, vendor));
        }
    }

    let vendor = vendor.trim();
    if !vendor.is_empty() && !base.to_lowercase().contains(&vendor.to_lowercase()) {
        return format!("{base} {vendor}");
    }
    name.trim().to_string()
}

pub fn rename_ru(name: &str, vendor: &str) -> String {
    let base = normalize_base(name);
    let vendor = vendor.trim();
    if !vendor.is_empty() && !base.to_lowercase().contains(&vendor.to_lowercase()) {
        return format!("{base} {vendor}");
    }
    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_units() {
        assert_eq!(normalize_base("Animal Flex 500g"), "Animal Flex");
        assert_eq!(normalize_base("Протеїн  сироватковий 900 г"), "Протеїн сироватковий");
        assert_eq!(normalize_base("Omega-3 Gold 120 капсул"), "Omega-3 Gold");
        assert_eq!(normalize_base("Вода вітамінна 0,5 л"), "Вода вітамінна");
        // A bare number without a unit is part of the name.
        assert_eq!(normalize_base("Omega 3"), "Omega 3");
    }

    #[test]
    fn phrase_override_wins_and_keeps_vendor_before_descriptor() {
        let title = rename_ua("Animal Flex 500g", "", "Universal");
        assert_eq!(title, "Animal Flex Universal — комплекс для суглобів та зв'язок");
        assert!(title.ends_with("— комплекс для суглобів та зв'язок"));
        assert!(title.contains("Universal"));
    }

    #[test]
    fn keyword_inference_composes_base_brand_label() {
        assert_eq!(
            rename_ua("Creatine Monohydrate", "", "Optimum"),
            "Creatine Monohydrate Optimum — креатин моногідрат"
        );
    }

    #[test]
    fn keyword_table_is_first_match_wins() {
        // "креатин" is listed before the protein keywords.
        assert_eq!(
            rename_ua("Креатин Whey Mix", "", ""),
            "Креатин Whey Mix — креатин моногідрат"
        );
    }

    #[test]
    fn purpose_extracted_from_description_without_barcode_tail() {
        let title = rename_ua(
            "XYZ Blend",
            "Рекомендовано для відновлення після тренувань. Штрихкод 123",
            "",
        );
        assert_eq!(title, "XYZ Blend — для відновлення після тренувань");
        assert!(!title.contains("123"));
    }

    #[test]
    fn purpose_falls_back_to_first_words() {
        let title = rename_ua(
            "XYZ Blend",
            "Смачний напій з вітамінами групи B та магнієм у зручному форматі. Артикул 7",
            "",
        );
        assert_eq!(title, "XYZ Blend — Смачний напій з вітамінами групи B та магнієм");
    }

    #[test]
    fn typed_name_is_left_alone() {
        let already = "Animal Flex Universal — комплекс для суглобів та зв'язок";
        assert_eq!(rename_ua(already, "будь-який опис", "Universal"), already);
        let with_colon = "Батончик: шоколад";
        assert_eq!(rename_ua(with_colon, "для перекусу в дорозі", ""), with_colon);
    }

    #[test]
    fn rename_is_idempotent() {
        let first = rename_ua("Creatine Monohydrate", "", "Optimum");
        assert_eq!(rename_ua(&first, "", "Optimum"), first);
        let first = rename_ua("Animal Flex 500g", "", "Universal");
        assert_eq!(rename_ua(&first, "", "Universal"), first);
    }

    #[test]
    fn brand_fallback_skips_present_brand() {
        assert_eq!(rename_ua("Batonchik", "", "BioTech"), "Batonchik BioTech");
        assert_eq!(rename_ua("BioTech Batonchik", "", "BioTech"), "BioTech Batonchik");
        assert_eq!(rename_ua("biotech batonchik", "", "BioTech"), "biotech batonchik");
    }

    #[test]
    fn no_rule_returns_raw_name() {
        assert_eq!(rename_ua("  Batonchik  ", "", ""), "Batonchik");
    }

    #[test]
    fn ru_never_infers_type_or_purpose() {
        assert_eq!(
            rename_ru("Creatine Monohydrate", "Optimum"),
            "Creatine Monohydrate Optimum"
        );
        assert_eq!(rename_ru("Animal Flex 500g", "Universal"), "Animal Flex Universal");
        let typed = "Animal Flex — комплекс для суставов и связок";
        assert_eq!(rename_ru(typed, ""), typed);
    }
}
