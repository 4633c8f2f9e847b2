use crate::traits::Named;

/// Generic words the model tends to wrap around a stored name.
const STOPWORDS: &[&str] = &[
    "obligation",
    "obligations",
    "goal",
    "goals",
    "delete",
    "remove",
    "cancel",
    "hapus",
    "batal",
    "batalkan",
    "kewajiban",
    "tabungan",
    "target",
    "utang",
    "hutang",
    "yang",
    "untuk",
    "buat",
    "saya",
    "aku",
];

const MIN_TOKEN_LEN: usize = 3;

fn tokens(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Find the item a free-text name refers to.
///
/// Tries a case-insensitive substring match in either direction first, then
/// falls back to matching individual query tokens; the item with the most
/// matching tokens wins, earliest item on ties.
pub fn find_by_name<'a, T: Named>(items: &'a [T], query: &str) -> Option<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(hit) = items.iter().find(|item| {
        let name = item.display_name().to_lowercase();
        !name.is_empty() && (name.contains(&needle) || needle.contains(&name))
    }) {
        return Some(hit);
    }

    let query_tokens = tokens(&needle);
    if query_tokens.is_empty() {
        return None;
    }

    let mut best: Option<(&T, usize)> = None;
    for item in items {
        let name = item.display_name().to_lowercase();
        let score = query_tokens
            .iter()
            .filter(|t| name.contains(t.as_str()))
            .count();
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((item, score));
        }
    }
    best.map(|(item, _)| item)
}
