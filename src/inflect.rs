//! English inflection for resource segments: "comment" <-> "comments", "category" <-> "categories".
//! Only the last `_`-separated word is inflected ("blog_post" -> "blog_posts").

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("wolf", "wolves"),
    ("shelf", "shelves"),
    ("thief", "thieves"),
    ("index", "indices"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("analysis", "analyses"),
    ("status", "statuses"),
    ("quiz", "quizzes"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "deer",
    "news",
    "metadata",
    "feedback",
];

pub fn pluralize(word: &str) -> String {
    inflect_last_word(word, plural_of)
}

pub fn singularize(word: &str) -> String {
    inflect_last_word(word, singular_of)
}

fn inflect_last_word(word: &str, f: fn(&str) -> String) -> String {
    match word.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => format!("{}_{}", head, f(last)),
        _ => f(word),
    }
}

fn plural_of(word: &str) -> String {
    if word.is_empty() || is_uncountable(word) {
        return word.to_string();
    }
    let lower = word.to_lowercase();
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == lower) {
        return plural.to_string();
    }
    if IRREGULAR.iter().any(|(_, p)| *p == lower) {
        return word.to_string();
    }
    if lower.ends_with('s') && singular_of(word) != word {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !ends_with_vowel(stem) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

fn singular_of(word: &str) -> String {
    if word.is_empty() || is_uncountable(word) {
        return word.to_string();
    }
    let lower = word.to_lowercase();
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, p)| *p == lower) {
        return singular.to_string();
    }
    if IRREGULAR.iter().any(|(s, _)| *s == lower) {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

fn is_uncountable(word: &str) -> bool {
    let lower = word.to_lowercase();
    UNCOUNTABLE.contains(&lower.as_str())
}

fn ends_with_vowel(s: &str) -> bool {
    s.chars()
        .last()
        .map(|c| "aeiou".contains(c.to_ascii_lowercase()))
        .unwrap_or(false)
}
