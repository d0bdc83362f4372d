use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic pseudo-random pair in [-1, 1] derived from an id.
/// Reloading the same graph seeds the same layout.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn trimmed_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut trimmed = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    trimmed.push('…');
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x1, y1) = stable_pair("node-a");
        let (x2, y2) = stable_pair("node-a");
        assert_eq!((x1, y1), (x2, y2));
        assert!((-1.0..=1.0).contains(&x1));
        assert!((-1.0..=1.0).contains(&y1));
    }

    #[test]
    fn trimmed_label_keeps_short_labels() {
        assert_eq!(trimmed_label("calculus", 16), "calculus");
        assert_eq!(trimmed_label("a very long concept label", 8), "a very …");
    }
}
