//! Classification of Google "answer cards" (calculator, conversions, definitions, weather, ...).
//!
//! Each layout is recognised by a distinctive element. A layout that is recognised but is
//! missing the data it needs produces no card at all rather than falling through to the
//! next layout.

use poise::serenity_prelude as serenity;
use scraper::{ElementRef, Node, Selector};

use super::{all_text, child_elements, has_class, leading_text, parent_element};

#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    pub value: f64,
    pub currency: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub word: String,
    pub pronunciation: String,
    pub category: String,
    pub senses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    Calculator {
        expression: String,
        result: Option<String>,
    },
    UnitConversion {
        from: Quantity,
        to: Quantity,
    },
    CurrencyConversion {
        from: Money,
        to: Money,
    },
    Information {
        title: String,
        body: String,
    },
    Translation {
        source_lang: String,
        source_text: String,
        target_lang: String,
        target_text: String,
    },
    TimeIn {
        title: String,
        time: String,
        date: String,
    },
    TimeConversion {
        original: String,
        converted: String,
    },
    Definition(Vec<Definition>),
    Weather {
        location: String,
        condition: String,
        icon_url: String,
        temperature: Option<String>,
        precipitation: Option<String>,
        humidity: Option<String>,
        wind: Option<String>,
    },
}

pub fn parse_card(node: ElementRef<'_>) -> Option<Card> {
    if let Some(calculator) = node.select(selector!(r#"span[class="cwclet"]"#)).next() {
        return Some(calculator_card(node, calculator));
    }

    let inputs: Vec<_> = node
        .select(selector!(r#"input[class*="_eif"][value]"#))
        .collect();
    if let [first, second] = inputs.as_slice() {
        return unit_conversion_card(*first, *second);
    }

    if node
        .value()
        .attr("class")
        .is_some_and(|class| class.contains("currency"))
    {
        let selectors: Vec<_> = node
            .select(selector!(r#"div[class="ccw_unit_selector_cnt"]"#))
            .collect();
        if let [first, second] = selectors.as_slice() {
            return currency_card(*first, *second);
        }
    }

    if let Some(info) = node.select(selector!(r#"div[class="_f2g"]"#)).next() {
        return information_card(info);
    }

    if let Some(translation) = node.select(selector!("div#tw-ob")).next() {
        return translation_card(translation);
    }

    if let Some(time) = child_elements(node, "div").find(|c| has_class(*c, "vk_bk vk_ans")) {
        return time_in_card(node, time);
    }

    // "time in" also comes in a form without spans
    if let Some(time) = child_elements(node, "div")
        .flat_map(|div| child_elements(div, "div"))
        .find(|c| has_class(*c, "vk_bk vk_ans _nEd"))
    {
        return time_conversion_card(time);
    }

    let words: Vec<_> = node
        .select(selector!(r#"span[data-dobid="hdw"]"#))
        .collect();
    if !words.is_empty() {
        return definition_card(&words);
    }

    weather_card(node)
}

fn calculator_card(node: ElementRef<'_>, calculator: ElementRef<'_>) -> Card {
    let result = node
        .select(selector!(r#"span[class="cwcot"]"#))
        .next()
        .map(|result| leading_text(result).unwrap_or_default().trim().to_string());
    Card::Calculator {
        expression: leading_text(calculator).unwrap_or_default(),
        result,
    }
}

/// The `<option selected="1">` of a `<select>` directly under `parent`.
fn selected_option(parent: ElementRef<'_>) -> Option<ElementRef<'_>> {
    child_elements(parent, "select")
        .flat_map(|select| child_elements(select, "option"))
        .find(|option| option.value().attr("selected") == Some("1"))
}

fn parse_value(element: ElementRef<'_>) -> Option<f64> {
    element.value().attr("value")?.trim().parse().ok()
}

fn unit_conversion_card(first: ElementRef<'_>, second: ElementRef<'_>) -> Option<Card> {
    // each <input> sits next to a <select> naming its unit
    let side = |input: ElementRef<'_>| -> Option<Quantity> {
        let parent = parent_element(input).filter(|p| p.value().name() == "div")?;
        let unit = leading_text(selected_option(parent)?)?;
        Some(Quantity {
            value: parse_value(input)?,
            unit,
        })
    };
    Some(Card::UnitConversion {
        from: side(first)?,
        to: side(second)?,
    })
}

fn currency_card(first: ElementRef<'_>, second: ElementRef<'_>) -> Option<Card> {
    let side = |selector: ElementRef<'_>| -> Option<Money> {
        let option = selected_option(selector)?;
        // the amount lives in the same table row as the selector
        let row = parent_element(selector)
            .filter(|td| td.value().name() == "td")
            .and_then(parent_element)
            .filter(|tr| tr.value().name() == "tr")?;
        let input = child_elements(row, "td")
            .flat_map(|td| child_elements(td, "input"))
            .find(|input| has_class(*input, "vk_gy vk_sh ccw_data"))?;
        Some(Money {
            value: parse_value(input)?,
            currency: leading_text(option)?,
            code: option.value().attr("value")?.to_string(),
        })
    };
    Some(Card::CurrencyConversion {
        from: side(first)?,
        to: side(second)?,
    })
}

fn information_card(info: ElementRef<'_>) -> Option<Card> {
    let container = parent_element(info)
        .filter(|p| p.value().name() == "div")
        .and_then(parent_element)
        .filter(|p| p.value().name() == "div")?;
    let body = container
        .select(selector!(r#"div[class="_XWk"], div[class*="kpd-ans"]"#))
        .next()?;
    Some(Card::Information {
        title: all_text(info).trim().to_string(),
        body: all_text(body).trim().to_string(),
    })
}

fn translation_card(translation: ElementRef<'_>) -> Option<Card> {
    let text = |element: Option<ElementRef<'_>>| element.and_then(leading_text);
    Some(Card::Translation {
        source_lang: text(
            translation
                .select(selector!(r#"select#tw-sl > option[selected="1"]"#))
                .next(),
        )?,
        source_text: text(
            translation
                .select(selector!("pre#tw-source-text > span"))
                .next(),
        )?,
        target_lang: text(
            translation
                .select(selector!(r#"select#tw-tl > option[selected="1"]"#))
                .next(),
        )?,
        target_text: text(
            translation
                .select(selector!("pre#tw-target-text > span"))
                .next(),
        )?,
    })
}

fn time_in_card(node: ElementRef<'_>, time: ElementRef<'_>) -> Option<Card> {
    let date = child_elements(node, "div").find(|c| has_class(*c, "vk_gy vk_sh"))?;
    let title = child_elements(node, "span").next().and_then(leading_text)?;
    Some(Card::TimeIn {
        title,
        time: leading_text(time)?,
        date: all_text(date).trim().to_string(),
    })
}

fn time_conversion_card(time: ElementRef<'_>) -> Option<Card> {
    let parent = parent_element(time)?;
    Some(Card::TimeConversion {
        original: text_without(parent, time).trim().to_string(),
        converted: all_text(time).trim().to_string(),
    })
}

/// Text of `element` with `skip` (and the text right after it) left out.
fn text_without(element: ElementRef<'_>, skip: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut after_skip = false;
    for child in element.children() {
        if child.id() == skip.id() {
            after_skip = true;
            continue;
        }
        match child.value() {
            // the removed element's tail
            Node::Text(_) if after_skip => after_skip = false,
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                after_skip = false;
                if let Some(element) = ElementRef::wrap(child) {
                    out.push_str(&text_without(element, skip));
                }
            }
            _ => {}
        }
    }
    out
}

fn definition_card(words: &[ElementRef<'_>]) -> Option<Card> {
    let mut definitions = vec![];
    for word in words {
        let Some(root) = parent_element(*word).and_then(parent_element) else {
            continue;
        };
        let Some(pronunciation) = root
            .select(selector!(r#"span[class="lr_dct_ph"] > span"#))
            .next()
        else {
            continue;
        };

        for category in root.select(selector!(r#"div[class="lr_dct_sf_h"] > i > span"#)) {
            // span -> i -> div.lr_dct_sf_h -> the section holding the senses
            let Some(section) = parent_element(category)
                .and_then(parent_element)
                .and_then(parent_element)
            else {
                continue;
            };
            let senses = child_elements(section, "ol")
                .filter(|ol| has_class(*ol, "lr_dct_sf_sens"))
                .flat_map(|ol| {
                    ol.select(selector!(
                        r#"div:not([class="lr_dct_sf_subsen"]) > div[class="_Jig"] > div[data-dobid="dfn"] > span"#
                    ))
                })
                .filter_map(leading_text)
                .collect();

            definitions.push(Definition {
                word: leading_text(*word).unwrap_or_default(),
                pronunciation: leading_text(pronunciation).unwrap_or_default(),
                category: leading_text(category).unwrap_or_default(),
                senses,
            });
        }
    }
    (!definitions.is_empty()).then_some(Card::Definition(definitions))
}

fn weather_card(node: ElementRef<'_>) -> Option<Card> {
    let location = child_elements(node, "div").find(|c| c.value().id() == Some("wob_loc"))?;
    let misc = node
        .select(selector!(r#"div[class="vk_gy vk_sh wob-dtl"]"#))
        .next()?;
    let category = node.select(selector!("img#wob_tci")).next()?;

    let temperatures: Vec<String> = node
        .select(selector!(r#"div#wob_d div[class*="vk_bk"] span[class="wob_t"]"#))
        .map(|t| leading_text(t).unwrap_or_default())
        .collect();
    // celsius value, fahrenheit value, then the two unit labels
    let temperature = match temperatures.as_slice() {
        [c, f, c_unit, f_unit] => Some(format!("{c}{c_unit} | {f}{f_unit}")),
        _ => None,
    };

    let detail = |css: &Selector| misc.select(css).next().and_then(leading_text);

    Some(Card::Weather {
        location: leading_text(location)?.trim().to_string(),
        condition: category.value().attr("alt").unwrap_or_default().to_string(),
        icon_url: format!("https:{}", category.value().attr("src")?),
        temperature,
        precipitation: detail(selector!("div > span#wob_pp")),
        humidity: detail(selector!("div > span#wob_hm")),
        wind: detail(selector!("div > span > span#wob_tws")),
    })
}

/// Python-style float formatting: always shows a fractional part, and exponents
/// carry a sign and at least two digits (`1e+16`, `1e-05`).
fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let debug = format!("{value:?}");
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => debug,
    }
}

impl Card {
    pub fn to_embed(&self) -> serenity::CreateEmbed {
        let embed = serenity::CreateEmbed::new().color(serenity::Colour::BLURPLE);
        match self {
            Card::Calculator { expression, result } => embed.title("Calculator").description(
                match result {
                    Some(result) => format!("{expression} {result}"),
                    None => format!("{expression} ???"),
                },
            ),
            Card::UnitConversion { from, to } => embed.title("Unit Conversion").description(
                format!(
                    "{} {} = {} {}",
                    format_number(from.value),
                    from.unit,
                    format_number(to.value),
                    to.unit
                ),
            ),
            Card::CurrencyConversion { from, to } => embed
                .title("Currency Conversion")
                .description(format!(
                    "{} {} ({}) = {} {} ({})",
                    format_number(from.value),
                    from.currency,
                    from.code,
                    format_number(to.value),
                    to.currency,
                    to.code
                )),
            Card::Information { title, body } => embed.title(title).description(body),
            Card::Translation {
                source_lang,
                source_text,
                target_lang,
                target_text,
            } => embed
                .title("Translation")
                .field(source_lang, source_text, true)
                .field(target_lang, target_text, true),
            Card::TimeIn { title, time, date } => {
                embed.title(title).description(format!("{time}\n{date}"))
            }
            Card::TimeConversion {
                original,
                converted,
            } => embed
                .title("Time Conversion")
                .description(format!("{original}...\n{converted}")),
            Card::Definition(definitions) => embed.fields(definitions.iter().map(|d| {
                let mut lines = vec![format!("*{}*", d.category)];
                lines.extend(
                    d.senses
                        .iter()
                        .enumerate()
                        .map(|(i, sense)| format!("{}. {sense}", i + 1)),
                );
                (
                    format!("{} /{}/", d.word, d.pronunciation),
                    lines.join("\n"),
                    true,
                )
            })),
            Card::Weather {
                location,
                condition,
                icon_url,
                temperature,
                precipitation,
                humidity,
                wind,
            } => {
                let mut embed = embed
                    .title(format!("Weather for {location}"))
                    .description(format!("*{condition}*"))
                    .thumbnail(icon_url)
                    .field(
                        "Temperature",
                        temperature.as_deref().unwrap_or("Unknown"),
                        false,
                    );
                for (name, value) in [
                    ("Precipitation", precipitation),
                    ("Humidity", humidity),
                    ("Wind", wind),
                ] {
                    if let Some(value) = value {
                        embed = embed.field(name, value, true);
                    }
                }
                embed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use scraper::Html;
    use serde_json::json;

    #[rstest]
    #[case(5280.0, "5280.0")]
    #[case(0.5, "0.5")]
    #[case(0.0001, "0.0001")]
    #[case(1e16, "1e+16")]
    #[case(1.5e20, "1.5e+20")]
    #[case(1e100, "1e+100")]
    #[case(1e-5, "1e-05")]
    #[case(1.25e-7, "1.25e-07")]
    #[case(f64::INFINITY, "inf")]
    fn numbers_print_like_python_floats(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    /// Parses `html` and runs the classifier on the first `div.card`.
    fn card(html: &str) -> Option<Card> {
        let document = Html::parse_fragment(html);
        let node = document
            .select(selector!("div.card"))
            .next()
            .expect("fixture has a card node");
        parse_card(node)
    }

    #[test]
    fn calculator() {
        let html = r#"<div class="card vk_c">
            <span class="cwclet">12 * 12 =</span>
            <span class="cwcot"> 144 </span>
        </div>"#;
        assert_eq!(
            card(html),
            Some(Card::Calculator {
                expression: "12 * 12 =".into(),
                result: Some("144".into()),
            })
        );
    }

    #[test]
    fn calculator_without_result() {
        let html = r#"<div class="card"><span class="cwclet">1 / 0 =</span></div>"#;
        let card = card(html).unwrap();
        let payload = serde_json::to_value(card.to_embed()).unwrap();
        assert_eq!(payload["description"], json!("1 / 0 = ???"));
    }

    #[test]
    fn unit_conversion() {
        let html = r#"<div class="card">
            <div><input class="_eif vk_gy" value="1"><select><option>Foot</option><option selected="1">Mile</option></select></div>
            <div><input class="_eif vk_gy" value="5280"><select><option selected="1">Foot</option></select></div>
        </div>"#;
        let card = card(html).unwrap();
        assert_eq!(
            card,
            Card::UnitConversion {
                from: Quantity {
                    value: 1.0,
                    unit: "Mile".into()
                },
                to: Quantity {
                    value: 5280.0,
                    unit: "Foot".into()
                },
            }
        );
        let payload = serde_json::to_value(card.to_embed()).unwrap();
        assert_eq!(payload["description"], json!("1.0 Mile = 5280.0 Foot"));
    }

    #[test]
    fn unit_conversion_with_bad_value_is_no_card() {
        let html = r#"<div class="card">
            <div><input class="_eif" value="lots"><select><option selected="1">Mile</option></select></div>
            <div><input class="_eif" value="2"><select><option selected="1">Foot</option></select></div>
        </div>"#;
        assert_eq!(card(html), None);
    }

    #[test]
    fn currency_conversion() {
        let html = r#"<div class="card currency">
            <table>
            <tr>
                <td><input class="vk_gy vk_sh ccw_data" value="1"></td>
                <td><div class="ccw_unit_selector_cnt"><select><option value="USD" selected="1">United States Dollar</option></select></div></td>
            </tr>
            <tr>
                <td><input class="vk_gy vk_sh ccw_data" value="0.92"></td>
                <td><div class="ccw_unit_selector_cnt"><select><option value="EUR" selected="1">Euro</option></select></div></td>
            </tr>
            </table>
        </div>"#;
        let card = card(html).unwrap();
        let payload = serde_json::to_value(card.to_embed()).unwrap();
        assert_eq!(payload["title"], json!("Currency Conversion"));
        assert_eq!(
            payload["description"],
            json!("1.0 United States Dollar (USD) = 0.92 Euro (EUR)")
        );
    }

    #[test]
    fn information() {
        let html = r#"<div class="card kp-blk">
            <div><div>
                <div><div class="_f2g">Height of <b>Mount Everest</b></div></div>
                <div class="_XWk"> 8,849 m </div>
            </div></div>
        </div>"#;
        assert_eq!(
            card(html),
            Some(Card::Information {
                title: "Height of Mount Everest".into(),
                body: "8,849 m".into(),
            })
        );
    }

    #[test]
    fn translation() {
        let html = r#"<div class="card"><div id="tw-ob">
            <select id="tw-sl"><option selected="1">English</option></select>
            <select id="tw-tl"><option>German</option><option selected="1">French</option></select>
            <pre id="tw-source-text"><span>cat</span></pre>
            <pre id="tw-target-text"><span>chat</span></pre>
        </div></div>"#;
        assert_eq!(
            card(html),
            Some(Card::Translation {
                source_lang: "English".into(),
                source_text: "cat".into(),
                target_lang: "French".into(),
                target_text: "chat".into(),
            })
        );
    }

    #[test]
    fn translation_missing_target_is_no_card() {
        let html = r#"<div class="card"><div id="tw-ob">
            <select id="tw-sl"><option selected="1">English</option></select>
            <pre id="tw-source-text"><span>cat</span></pre>
        </div></div>"#;
        assert_eq!(card(html), None);
    }

    #[test]
    fn time_in() {
        let html = r#"<div class="card vk_c"><div class="vk_bk vk_ans">4:20 PM</div><div class="vk_gy vk_sh"> Friday, <span>April 20, 2018</span> </div><span>Time in Tokyo, Japan</span></div>"#;
        let card = card(html).unwrap();
        assert_eq!(
            card,
            Card::TimeIn {
                title: "Time in Tokyo, Japan".into(),
                time: "4:20 PM".into(),
                date: "Friday, April 20, 2018".into(),
            }
        );
        let payload = serde_json::to_value(card.to_embed()).unwrap();
        assert_eq!(payload["description"], json!("4:20 PM\nFriday, April 20, 2018"));
    }

    #[test]
    fn time_conversion() {
        let html = r#"<div class="card vk_c"><div>5:00 PM Pacific Time is <div class="vk_bk vk_ans _nEd">9:00 AM Saturday, in Tokyo</div>left out</div></div>"#;
        assert_eq!(
            card(html),
            Some(Card::TimeConversion {
                original: "5:00 PM Pacific Time is".into(),
                converted: "9:00 AM Saturday, in Tokyo".into(),
            })
        );
    }

    #[test]
    fn definition() {
        let html = r#"<div class="card kp-blk">
          <div class="lr_dct_ent">
            <div><span data-dobid="hdw">rust</span></div>
            <span class="lr_dct_ph"><span>rəst</span></span>
            <div>
              <div class="lr_dct_sf_h"><i><span>noun</span></i></div>
              <ol class="lr_dct_sf_sens">
                <li><div><div class="_Jig"><div data-dobid="dfn"><span>a reddish-brown flaky coating of iron oxide</span></div></div></div>
                  <div class="lr_dct_sf_subsen"><div class="_Jig"><div data-dobid="dfn"><span>a nested sense</span></div></div></div>
                </li>
                <li><div><div class="_Jig"><div data-dobid="dfn"><span>a fungal disease of plants</span></div></div></div></li>
              </ol>
            </div>
          </div>
        </div>"#;
        let card = card(html).unwrap();
        assert_eq!(
            card,
            Card::Definition(vec![Definition {
                word: "rust".into(),
                pronunciation: "rəst".into(),
                category: "noun".into(),
                senses: vec![
                    "a reddish-brown flaky coating of iron oxide".into(),
                    "a fungal disease of plants".into(),
                ],
            }])
        );
        let payload = serde_json::to_value(card.to_embed()).unwrap();
        assert_eq!(payload["fields"][0]["name"], json!("rust /rəst/"));
        assert_eq!(
            payload["fields"][0]["value"],
            json!("*noun*\n1. a reddish-brown flaky coating of iron oxide\n2. a fungal disease of plants")
        );
    }

    #[test]
    fn definition_without_pronunciation_is_skipped() {
        let html = r#"<div class="card"><div><div><span data-dobid="hdw">word</span></div></div></div>"#;
        assert_eq!(card(html), None);
    }

    #[test]
    fn weather() {
        let html = r#"<div class="card vk_c">
            <div id="wob_loc"> Berlin, Germany </div>
            <div id="wob_dts">Saturday 12:00</div>
            <img id="wob_tci" alt="Partly cloudy" src="//ssl.gstatic.com/weather/partly_cloudy.png">
            <div id="wob_d"><div class="vk_bk sol-tmp">
                <span class="wob_t">21</span><span class="wob_t">70</span>
                <span class="wob_t">°C</span><span class="wob_t">°F</span>
            </div></div>
            <div class="vk_gy vk_sh wob-dtl">
                <div>Precipitation: <span id="wob_pp">10%</span></div>
                <div>Humidity: <span id="wob_hm">55%</span></div>
                <div>Wind: <span><span id="wob_tws">11 km/h</span></span></div>
            </div>
        </div>"#;
        let card = card(html).unwrap();
        assert_eq!(
            card,
            Card::Weather {
                location: "Berlin, Germany".into(),
                condition: "Partly cloudy".into(),
                icon_url: "https://ssl.gstatic.com/weather/partly_cloudy.png".into(),
                temperature: Some("21°C | 70°F".into()),
                precipitation: Some("10%".into()),
                humidity: Some("55%".into()),
                wind: Some("11 km/h".into()),
            }
        );
        let payload = serde_json::to_value(card.to_embed()).unwrap();
        assert_eq!(payload["title"], json!("Weather for Berlin, Germany"));
        assert_eq!(payload["fields"][0]["value"], json!("21°C | 70°F"));
        assert_eq!(payload["fields"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn weather_without_details_is_no_card() {
        let html = r#"<div class="card"><div id="wob_loc">Berlin</div></div>"#;
        assert_eq!(card(html), None);
    }

    #[test]
    fn unknown_layout_is_no_card() {
        assert_eq!(card(r#"<div class="card"><p>Just text</p></div>"#), None);
    }
}
