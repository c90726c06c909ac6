use crate::Feature;
use serde::Serialize;

/// A feature whose key is close to what the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureMatch {
    pub name: String,
    pub distance: usize,
}

/// Case-insensitive Levenshtein distance, counted over characters.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            table[i][j] = (table[i - 1][j] + 1)
                .min(table[i][j - 1] + 1)
                .min(table[i - 1][j - 1] + cost);
        }
    }

    table[a.len()][b.len()]
}

/// Features within `max_distance` edits of `input`, closest first.
///
/// Ties keep the order of `features`.
pub fn find_similar_features(
    input: &str,
    features: &[Feature],
    max_distance: usize,
) -> Vec<FeatureMatch> {
    let mut matches: Vec<FeatureMatch> = features
        .iter()
        .map(|f| FeatureMatch {
            name: f.name.clone(),
            distance: levenshtein_distance(input, &f.name),
        })
        .filter(|m| m.distance <= max_distance)
        .collect();
    matches.sort_by_key(|m| m.distance);
    matches
}
