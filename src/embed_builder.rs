//! A small markup for building embeds from a single message.
//!
//! `{title: Hello|description: World}{field: Name|value: Text|inline: false}{color: #ff0000}`

use std::collections::HashMap;

use poise::serenity_prelude as serenity;
use rand::Rng;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmbedError {
    #[error("Chosen color is not defined.")]
    ChosenColorUndefined,
    #[error("`{0}` is not a valid hex color.")]
    InvalidColor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Random,
    Chosen,
    Fixed(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub icon_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub text: String,
    pub icon_url: Option<String>,
}

/// Everything the markup can describe, before colours are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<ColorChoice>,
    pub author: Option<Author>,
    pub fields: Vec<Field>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub footer: Option<Footer>,
    pub timestamp: bool,
}

/// Whether the text uses the section markup at all.
pub fn has_markup(input: &str) -> bool {
    input.contains('{') || input.contains('}')
}

/// Contents of each `{...}` section. An unterminated section runs to the end of the input.
fn sections(input: &str) -> Vec<&str> {
    let mut result = vec![];
    let mut rest = input;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                result.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => {
                result.push(after);
                break;
            }
        }
    }
    result
}

/// `key: value` pairs of one section. Keys are lower-cased, empty values dropped.
fn section_pairs(section: &str) -> HashMap<String, String> {
    section
        .split('|')
        .filter_map(|part| {
            let (key, value) = part.split_once(':').unwrap_or((part, ""));
            let value = value.trim();
            (!value.is_empty()).then(|| (key.trim().to_lowercase(), value.to_string()))
        })
        .collect()
}

/// `{timestamp}` only counts when it is the sole key of its section.
fn is_timestamp_section(section: &str) -> bool {
    section.split('|').all(|part| {
        let key = part.split_once(':').map_or(part, |(key, _)| key);
        key.trim().eq_ignore_ascii_case("timestamp")
    })
}

fn parse_color(value: &str) -> Result<ColorChoice, EmbedError> {
    match value.to_lowercase().as_str() {
        "random" => Ok(ColorChoice::Random),
        "chosen" => Ok(ColorChoice::Chosen),
        _ => u32::from_str_radix(value.trim_start_matches('#'), 16)
            .ok()
            .filter(|raw| *raw <= 0xFFFFFF)
            .map(ColorChoice::Fixed)
            .ok_or_else(|| EmbedError::InvalidColor(value.to_string())),
    }
}

impl EmbedSpec {
    pub fn parse(input: &str) -> Result<Self, EmbedError> {
        let mut spec = EmbedSpec::default();
        if !has_markup(input) {
            spec.description = Some(input.to_string()).filter(|d| !d.is_empty());
            return Ok(spec);
        }

        for section in sections(input) {
            let data = section_pairs(section);
            let get = |key: &str| data.get(key).cloned();

            if let Some(color) = get("color").or_else(|| get("colour")) {
                spec.color = Some(parse_color(&color)?);
            }
            if let Some(description) = get("description") {
                spec.description = Some(description);
            }
            if let Some(description) = get("desc") {
                spec.description = Some(description);
            }
            if let Some(title) = get("title") {
                spec.title = Some(title);
            }
            if let Some(url) = get("url") {
                spec.url = Some(url);
            }
            if let Some(name) = get("author") {
                spec.author = Some(Author {
                    name,
                    icon_url: get("icon"),
                    url: get("url"),
                });
            }
            if let (Some(name), Some(value)) = (get("field"), get("value")) {
                let inline = !get("inline").is_some_and(|i| i.eq_ignore_ascii_case("false"));
                spec.fields.push(Field {
                    name,
                    value,
                    inline,
                });
            }
            if let Some(thumbnail) = get("thumbnail") {
                spec.thumbnail = Some(thumbnail);
            }
            if let Some(image) = get("image") {
                spec.image = Some(image);
            }
            if let Some(text) = get("footer") {
                spec.footer = Some(Footer {
                    text,
                    icon_url: get("icon"),
                });
            }
            if is_timestamp_section(section) {
                spec.timestamp = true;
            }
        }
        Ok(spec)
    }

    /// Resolves colours and builds the embed.
    pub fn build(
        self,
        chosen: Option<serenity::Colour>,
        timestamp: serenity::Timestamp,
        rng: &mut impl Rng,
    ) -> Result<serenity::CreateEmbed, EmbedError> {
        let mut embed = serenity::CreateEmbed::new();

        match self.color {
            Some(ColorChoice::Random) => embed = embed.color(rng.gen_range(0..=0xFFFFFF_u32)),
            Some(ColorChoice::Chosen) => {
                embed = embed.color(chosen.ok_or(EmbedError::ChosenColorUndefined)?)
            }
            Some(ColorChoice::Fixed(raw)) => embed = embed.color(raw),
            None => {}
        }
        if let Some(title) = self.title {
            embed = embed.title(title);
        }
        if let Some(description) = self.description {
            embed = embed.description(description);
        }
        if let Some(url) = self.url {
            embed = embed.url(url);
        }
        if let Some(author) = self.author {
            let mut create = serenity::CreateEmbedAuthor::new(author.name);
            if let Some(icon) = author.icon_url {
                create = create.icon_url(icon);
            }
            if let Some(url) = author.url {
                create = create.url(url);
            }
            embed = embed.author(create);
        }
        embed = embed.fields(
            self.fields
                .into_iter()
                .map(|field| (field.name, field.value, field.inline)),
        );
        if let Some(thumbnail) = self.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }
        if let Some(image) = self.image {
            embed = embed.image(image);
        }
        if let Some(footer) = self.footer {
            let mut create = serenity::CreateEmbedFooter::new(footer.text);
            if let Some(icon) = footer.icon_url {
                create = create.icon_url(icon);
            }
            embed = embed.footer(create);
        }
        if self.timestamp {
            embed = embed.timestamp(timestamp);
        }
        Ok(embed)
    }
}
