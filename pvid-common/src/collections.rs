//! Order-preserving list helpers

use std::collections::HashSet;

/// Remove duplicates, keeping the first occurrence of each value.
///
/// Empty strings are dropped: a blank device or id column carries no information
/// and must not show up as a distinct entry in reports.
pub fn dedup_keep_order<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let value = value.into();
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

/// Values of `source` not present in `remove`, in `source` order
pub fn subtract<'a>(source: &'a [String], remove: &HashSet<&str>) -> Vec<&'a String> {
    source
        .iter()
        .filter(|value| !remove.contains(value.as_str()))
        .collect()
}
