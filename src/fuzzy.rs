//! String similarity scoring used by the documentation lookup.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").expect("regex is valid"));

/// A scored candidate: the key that matched, its score and the value stored under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a, V> {
    pub key: &'a str,
    pub score: u8,
    pub value: &'a V,
}

/// Similarity of two strings as a percentage, in the Ratcliff/Obershelp sense.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let matched = matching_chars(&a, &b);
    let ratio = 2.0 * matched as f64 / total as f64;
    (100.0 * ratio).round_ties_even() as u8
}

/// Scores after sorting the words of both strings, so word order does not matter.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

fn sort_tokens(s: &str) -> String {
    let cleaned = NON_WORD.replace_all(s, " ").to_lowercase();
    let mut tokens: Vec<&str> = cleaned.trim().split(' ').collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Total size of the matching blocks found by repeatedly taking the longest common substring.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut queue = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`; ties go to the earliest start.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run lengths ending at the previous row, indexed by position in b
    let mut prev = vec![0usize; bhi - blo + 1];
    for i in alo..ahi {
        let mut current = vec![0usize; bhi - blo + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                current[j - blo + 1] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        prev = current;
    }
    (best_i, best_j, best_k)
}

/// Every choice scoring at least `cutoff`, best first, at most `limit` of them.
///
/// Equal scores keep the order of `choices`.
pub fn extract<'a, V>(
    query: &str,
    choices: &'a [(String, V)],
    scorer: fn(&str, &str) -> u8,
    limit: usize,
    cutoff: u8,
) -> Vec<Match<'a, V>> {
    let mut matches: Vec<_> = choices
        .iter()
        .filter_map(|(key, value)| {
            let score = scorer(query, key);
            (score >= cutoff).then_some(Match {
                key: key.as_str(),
                score,
                value,
            })
        })
        .collect();
    matches.sort_by(|x, y| y.score.cmp(&x.score));
    matches.truncate(limit);
    matches
}

/// Like [`extract`], but collapses to the top match when it is exact or far ahead of the rest.
pub fn extract_or_exact<'a, V>(
    query: &str,
    choices: &'a [(String, V)],
    scorer: fn(&str, &str) -> u8,
    limit: usize,
    cutoff: u8,
) -> Vec<Match<'a, V>> {
    let mut matches = extract(query, choices, scorer, limit, cutoff);
    if matches.len() >= 2 {
        let top = matches[0].score;
        let second = matches[1].score;
        if top == 100 || u16::from(top) > u16::from(second) + 30 {
            matches.truncate(1);
        }
    }
    matches
}
