//! Fuzzy lookup over the permalinks of a Sphinx documentation site.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::LazyLock,
};

use regex::{Captures, Regex};
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::fuzzy::{self, Match};

const RESULT_LIMIT: usize = 5;
const SCORE_CUTOFF: u8 = 50;

/// Public methods of `abc.Messageable`, which are documented under that name only.
const MESSAGEABLE_METHODS: [&str; 6] = [
    "fetch_message",
    "history",
    "pins",
    "send",
    "trigger_typing",
    "typing",
];

static SHORTHANDS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("vc", "VoiceClient"),
        ("msg", "Message"),
        ("color", "Colour"),
        ("perm", "Permissions"),
        ("channel", "TextChannel"),
        ("chan", "TextChannel"),
    ])
});

static SHORTHAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = SHORTHANDS
        .keys()
        .map(|k| format!(r"\b{k}\b"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternatives).expect("shorthand pattern is valid")
});

static HEADERLINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt > a.headerlink").expect("selector is valid"));

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("Cannot build rtfm lookup table, try again later.")]
    Unavailable,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Maps documented names (`Client.run`, `Bot`, ...) to their permalinks, in page order.
#[derive(Debug, Default, Clone)]
pub struct DocsIndex {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl DocsIndex {
    pub async fn build(
        client: &reqwest::Client,
        base: &Url,
        pages: &[String],
    ) -> Result<Self, DocsError> {
        let mut index = DocsIndex::default();
        for page in pages {
            let url = base.join(page)?;
            let resp = client.get(url.clone()).send().await?;
            if resp.status() != reqwest::StatusCode::OK {
                return Err(DocsError::Unavailable);
            }
            let text = resp.text().await?;
            index.add_page(url.as_str(), &text);
        }
        info!(entries = index.len(), "built documentation index");
        Ok(index)
    }

    fn add_page(&mut self, page_url: &str, html: &str) {
        let document = Html::parse_document(html);
        for node in document.select(&HEADERLINK) {
            let href = node.value().attr("href").unwrap_or_default();
            let key = href.replace("#discord.", "").replace("ext.commands.", "");
            let permalink = format!("{page_url}{href}");
            // a name defined twice keeps its first position and the latest link
            match self.positions.entry(key) {
                Entry::Occupied(slot) => self.entries[*slot.get()].1 = permalink,
                Entry::Vacant(slot) => {
                    self.entries.push((slot.key().clone(), permalink));
                    slot.insert(self.entries.len() - 1);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, query: &str) -> Vec<Match<'_, String>> {
        fuzzy::extract_or_exact(
            &normalize_query(query),
            &self.entries,
            fuzzy::token_sort_ratio,
            RESULT_LIMIT,
            SCORE_CUTOFF,
        )
    }
}

/// Rewrites a user query into the names the documentation actually uses.
pub fn normalize_query(query: &str) -> String {
    // identifiers don't have spaces
    let query = query.replace(' ', "_");

    let lowered = query.to_lowercase();
    let query = match MESSAGEABLE_METHODS.iter().find(|name| **name == lowered) {
        Some(name) => format!("abc.Messageable.{name}"),
        None => query,
    };

    SHORTHAND_PATTERN
        .replace_all(&query, |caps: &Captures| {
            SHORTHANDS.get(&caps[0]).copied().unwrap_or_default().to_string()
        })
        .into_owned()
}

/// One markdown line per match: `[key](url) (score%)`.
pub fn format_matches(matches: &[Match<'_, String>]) -> String {
    matches
        .iter()
        .map(|m| format!("[{}]({}) ({}%)", m.key, m.value, m.score))
        .collect::<Vec<_>>()
        .join("\n")
}
