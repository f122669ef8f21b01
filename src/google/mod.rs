//! Scrapes Google's search result page for links and answer cards.

/// A CSS selector compiled once, on first use.
macro_rules! selector {
    ($css:expr) => {{
        static SELECTOR: ::std::sync::LazyLock<::scraper::Selector> =
            ::std::sync::LazyLock::new(|| {
                ::scraper::Selector::parse($css).expect("selector is valid")
            });
        &*SELECTOR
    }};
}

mod card;

pub use card::Card;

use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.3; Win64; x64) Gecko/20100101 Firefox/53.0";

const CARD_LINKS: usize = 3;
const SEE_ALSO_LINKS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Google has failed to respond.")]
    Unavailable,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub card: Option<Card>,
    pub entries: Vec<Entry>,
}

pub async fn search(
    client: &reqwest::Client,
    base: &Url,
    query: &str,
) -> Result<SearchPage, SearchError> {
    let url = base.join("search")?;
    let resp = client
        .get(url)
        .query(&[("q", query), ("safe", "on"), ("lr", "lang_en"), ("hl", "en")])
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?;

    if resp.status() != reqwest::StatusCode::OK {
        warn!(status = %resp.status(), "Google failed to respond");
        return Err(SearchError::Unavailable);
    }

    let html = resp.text().await?;
    let page = parse_page(&html);
    debug!(
        entries = page.entries.len(),
        card = page.card.is_some(),
        "parsed search results"
    );
    Ok(page)
}

/*
Results look roughly like this:
<div class="rc">
    <h3 class="r">
        <a href="url here">title here</a>
    </h3>
</div>
*/
pub fn parse_page(html: &str) -> SearchPage {
    let document = Html::parse_document(html);

    let card = document
        .select(selector!(
            r#"div#rso > div[class="_NId"] div[class*="vk_c"],
            div#rso > div[class="_NId"] div[class="g mnr-c g-blk"],
            div#rso > div[class="_NId"] div[class="kp-blk"]"#
        ))
        .next()
        .and_then(card::parse_card);

    let entries = document
        .select(selector!(r#"div[class="rc"]"#))
        .filter_map(|result| {
            let link = child_elements(result, "h3")
                .filter(|h3| has_class(*h3, "r"))
                .flat_map(|h3| child_elements(h3, "a"))
                .next()?;
            let url = link.value().attr("href")?.to_string();
            let title = leading_text(link).unwrap_or_else(|| all_text(link));
            Some(Entry { url, title })
        })
        .collect();

    SearchPage { card, entries }
}

/// Links appended to a card: `[title](url)` for the first few results.
pub fn card_links(entries: &[Entry]) -> Option<String> {
    let links = entries
        .iter()
        .take(CARD_LINKS)
        .map(|e| format!("[{}]({})", e.title, e.url.replace(')', "%29")))
        .collect::<Vec<_>>();
    (!links.is_empty()).then(|| links.join("\n"))
}

/// The reply when there is no card: the top URL, then a couple more as "see also".
pub fn plain_reply(entries: &[Entry]) -> Option<String> {
    let (first, rest) = entries.split_first()?;
    let mut top = first.url.clone();
    if top.ends_with(')') {
        top.pop();
        top.push_str("%29");
    }

    let see_also = rest
        .iter()
        .take(SEE_ALSO_LINKS)
        .map(|e| format!("<{}>", e.url))
        .collect::<Vec<_>>();
    if see_also.is_empty() {
        Some(top)
    } else {
        Some(format!("{top}\n\n**See also:**\n{}", see_also.join("\n")))
    }
}

fn child_elements<'a>(
    element: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Whether the `class` attribute is exactly `class`.
fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().attr("class") == Some(class)
}

/// The text before the element's first child element.
fn leading_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.first_child()?.value().as_text()?;
    Some(text.to_string())
}

fn all_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const RESULTS_PAGE: &str = r#"<html><body>
        <div id="rso">
            <div class="_NId">
                <div class="g">
                    <div class="vk_c card-section">
                        <span class="cwclet">2 + 2 =</span><span class="cwcot">4</span>
                    </div>
                </div>
            </div>
            <div class="_NId">
                <div class="g"><div class="rc"><h3 class="r"><a href="https://rust-lang.org/">Rust Programming Language</a></h3></div></div>
                <div class="g"><div class="rc"><h3 class="r"><a href="https://en.wikipedia.org/wiki/Rust_(programming_language)">Rust (programming language)</a></h3></div></div>
                <div class="g"><div class="rc"><h3 class="other"><a href="https://ignored.example/">Ignored</a></h3></div></div>
                <div class="g"><div class="rc"><h3 class="r"><a href="https://doc.rust-lang.org/book/">The Book</a></h3></div></div>
            </div>
        </div>
    </body></html>"#;

    fn entries() -> Vec<Entry> {
        vec![
            Entry {
                url: "https://rust-lang.org/".into(),
                title: "Rust Programming Language".into(),
            },
            Entry {
                url: "https://en.wikipedia.org/wiki/Rust_(programming_language)".into(),
                title: "Rust (programming language)".into(),
            },
            Entry {
                url: "https://doc.rust-lang.org/book/".into(),
                title: "The Book".into(),
            },
        ]
    }

    #[test]
    fn parses_card_and_entries() {
        let page = parse_page(RESULTS_PAGE);
        assert_eq!(
            page.card,
            Some(Card::Calculator {
                expression: "2 + 2 =".into(),
                result: Some("4".into()),
            })
        );
        assert_eq!(page.entries, entries());
    }

    fn card_page(blocks: &[(&str, &str)]) -> String {
        let blocks: String = blocks
            .iter()
            .map(|(class, expression)| {
                format!(r#"<div class="{class}"><span class="cwclet">{expression}</span></div>"#)
            })
            .collect();
        format!(r#"<html><body><div id="rso"><div class="_NId">{blocks}</div></div></body></html>"#)
    }

    fn calculation(expression: &str) -> Card {
        Card::Calculator {
            expression: expression.into(),
            result: None,
        }
    }

    #[rstest]
    #[case("vk_c card-section", true)]
    #[case("g mnr-c g-blk", true)]
    #[case("kp-blk", true)]
    #[case("kp-blk extra", false)]
    #[case("g mnr-c", false)]
    #[case("card-section", false)]
    fn card_candidates_match_by_class(#[case] class: &str, #[case] is_card: bool) {
        let page = parse_page(&card_page(&[(class, "3 * 3 =")]));
        assert_eq!(page.card, is_card.then(|| calculation("3 * 3 =")));
    }

    #[test]
    fn first_card_candidate_in_the_document_wins() {
        let page = parse_page(&card_page(&[
            ("kp-blk", "1 + 1 ="),
            ("vk_c", "2 + 2 ="),
            ("g mnr-c g-blk", "3 + 3 ="),
        ]));
        assert_eq!(page.card, Some(calculation("1 + 1 =")));
    }

    #[test]
    fn page_without_results_is_empty() {
        assert_eq!(parse_page("<html><body><p>captcha</p></body></html>"), SearchPage::default());
    }

    #[test]
    fn card_links_escape_parentheses() {
        assert_eq!(
            card_links(&entries()).unwrap(),
            "[Rust Programming Language](https://rust-lang.org/)\n\
             [Rust (programming language)](https://en.wikipedia.org/wiki/Rust_(programming_language%29)\n\
             [The Book](https://doc.rust-lang.org/book/)"
        );
        assert_eq!(card_links(&[]), None);
    }

    #[test]
    fn plain_reply_lists_see_also() {
        assert_eq!(
            plain_reply(&entries()).unwrap(),
            "https://rust-lang.org/\n\n**See also:**\n\
             <https://en.wikipedia.org/wiki/Rust_(programming_language)>\n\
             <https://doc.rust-lang.org/book/>"
        );
    }

    #[test]
    fn plain_reply_escapes_trailing_parenthesis() {
        let entries = &entries()[1..2];
        assert_eq!(
            plain_reply(entries).unwrap(),
            "https://en.wikipedia.org/wiki/Rust_(programming_language%29"
        );
        assert_eq!(plain_reply(&[]), None);
    }

    #[tokio::test]
    async fn searches_with_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust lang"))
            .and(query_param("safe", "on"))
            .and(header("user-agent", BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let page = search(&reqwest::Client::new(), &base, "rust lang")
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 3);
        assert!(page.card.is_some());
    }

    #[tokio::test]
    async fn non_ok_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let err = search(&reqwest::Client::new(), &base, "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Unavailable));
    }
}
