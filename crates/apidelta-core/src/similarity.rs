//! String similarity for rename detection.
//!
//! The score of two identifiers is the better of two measures:
//!
//! - Jaro-Winkler similarity of the lowercased strings, which rewards shared
//!   prefixes and small edits (`userName` / `username`).
//! - Sørensen-Dice coefficient over identifier words, split at case changes,
//!   underscores, hyphens and digits (`userId` / `id` share the word `id`).

use apidelta_model::TypeName;

/// Similarity of two identifiers in `[0, 1]`. Symmetric, and `1.0` for equal
/// inputs.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    jaro_winkler(&lower_a, &lower_b).max(word_dice(a, b))
}

/// Whether two type names denote the same type up to a rename.
///
/// Primitive names only match themselves.
pub fn type_names_match(a: &TypeName, b: &TypeName, threshold: f64) -> bool {
    if a == b {
        return true;
    }
    if a.is_primitive() || b.is_primitive() {
        return false;
    }
    similarity(a.name(), b.name()) >= threshold
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(b.len());
        for j in start..end {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count() / 2;

    let m = matches as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions as f64) / m) / 3.0
}

fn jaro_winkler(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let sim = jaro(&a, &b);
    let prefix = a
        .iter()
        .zip(&b)
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();
    sim + prefix as f64 * 0.1 * (1.0 - sim)
}

/// Split an identifier into lowercase words.
fn words(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;

    for c in identifier.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous = None;
            continue;
        }
        let boundary = match previous {
            Some(p) => {
                (p.is_lowercase() && c.is_uppercase())
                    || (p.is_ascii_digit() != c.is_ascii_digit())
            }
            None => false,
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        previous = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.sort();
    words.dedup();
    words
}

fn word_dice(a: &str, b: &str) -> f64 {
    let wa = words(a);
    let wb = words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let shared = wa.iter().filter(|w| wb.contains(w)).count();
    2.0 * shared as f64 / (wa.len() + wb.len()) as f64
}
