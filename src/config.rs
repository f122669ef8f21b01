use std::path::PathBuf;

use anyhow::Context;
use poise::serenity_prelude as serenity;
use serde::{de::Error, Deserialize, Deserializer};
use url::Url;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub dev: bool,
    pub bot_token: String,
    pub webhook_url: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_langs_path")]
    pub langs_path: PathBuf,
    #[serde(default = "default_embed_color", deserialize_with = "hex_color")]
    pub default_embed_color: serenity::Color,
    /// The colour picked by `color: chosen` in the embed builder.
    #[serde(default, rename = "color", deserialize_with = "optional_hex_color")]
    pub chosen_color: Option<serenity::Color>,
    #[serde(default = "default_translate_url")]
    pub translate_url: Url,
    #[serde(default = "default_search_url")]
    pub search_url: Url,
    #[serde(default = "default_docs_url")]
    pub docs_url: Url,
    #[serde(default = "default_docs_pages")]
    pub docs_pages: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let dev = std::env::var("DEV").is_ok();
        if dev {
            dotenvy::from_filename(".dev.env").context(".dev.env should exist")?;
        } else {
            dotenvy::dotenv().ok();
        }

        let config = envy::from_env::<Config>().context("Configuration is invalid")?;
        Ok(Config { dev, ..config })
    }
}

pub fn parse_hex_color(s: &str) -> Result<serenity::Color, std::num::ParseIntError> {
    let raw = u32::from_str_radix(s.trim().trim_start_matches('#'), 16)?;
    Ok(serenity::Colour(raw))
}

fn hex_color<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<serenity::Color, D::Error> {
    let s: String = Deserialize::deserialize(d)?;
    parse_hex_color(&s).map_err(D::Error::custom)
}

fn optional_hex_color<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<serenity::Color>, D::Error> {
    let s: Option<String> = Deserialize::deserialize(d)?;
    s.filter(|s| !s.trim().is_empty())
        .map(|s| parse_hex_color(&s).map_err(D::Error::custom))
        .transpose()
}

fn default_prefix() -> String {
    ".".into()
}

fn default_database_url() -> String {
    ":memory:".into()
}

fn default_langs_path() -> PathBuf {
    PathBuf::from("data/langs.csv")
}

fn default_embed_color() -> serenity::Color {
    serenity::Colour::BLURPLE
}

fn default_translate_url() -> Url {
    Url::parse("https://translate.googleapis.com/").expect("default URL is valid")
}

fn default_search_url() -> Url {
    Url::parse("https://www.google.com/").expect("default URL is valid")
}

fn default_docs_url() -> Url {
    Url::parse("https://discordpy.readthedocs.io/en/latest/").expect("default URL is valid")
}

fn default_docs_pages() -> Vec<String> {
    vec!["api.html".into(), "ext/commands/api.html".into()]
}
