use poise::{serenity_prelude as serenity, CreateReply};
use span_derive::inject_span;

use crate::{
    docs::{self, DocsError},
    google::{self, SearchError},
    Context, Result, Spanned,
};

use super::Cog;

pub fn cog() -> Cog {
    Cog::new(vec![google(), rtfm()], "Search".to_string())
}

/// Searches Google
#[inject_span]
#[poise::command(prefix_command, slash_command, aliases("g"))]
async fn google(
    ctx: Context<'_>,
    #[description = "What to search for"]
    #[rest]
    query: String,
) -> Result<()> {
    ctx.defer_or_broadcast().await?;

    let data = ctx.data();
    let page = match google::search(&data.http, &data.config.search_url, &query).await {
        Ok(page) => page,
        Err(e @ SearchError::Unavailable) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(card) = &page.card {
        let mut embed = card.to_embed();
        if let Some(links) = google::card_links(&page.entries) {
            embed = embed.field("Search Results", links, false);
        }
        ctx.send(CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let reply = google::plain_reply(&page.entries)
        .unwrap_or_else(|| "No results found... sorry.".to_string());
    ctx.say(reply).await?;
    Ok(())
}

/// Gives you a documentation link for a discord.py entity
///
/// Events, objects, and functions are all supported through a fuzzy matching system.
#[inject_span]
#[poise::command(prefix_command, aliases("rtfd"), subcommands("refresh"))]
async fn rtfm(
    ctx: Context<'_>,
    #[description = "Entity to look up"]
    #[rest]
    query: Option<String>,
) -> Result<()> {
    let data = ctx.data();
    let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
        ctx.say(data.config.docs_url.as_str()).await?;
        return Ok(());
    };

    if !data.docs_cached().await {
        ctx.defer_or_broadcast().await?;
    }
    let index = match data.docs_index().await {
        Ok(index) => index,
        Err(e @ DocsError::Unavailable) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let matches = index.lookup(&query);
    if matches.is_empty() {
        ctx.say("Could not find anything. Sorry.").await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .color(serenity::Colour::BLURPLE)
        .description(docs::format_matches(&matches));
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Rebuilds the documentation lookup table
#[inject_span]
#[poise::command(prefix_command, owners_only, hide_in_help)]
async fn refresh(ctx: Context<'_>) -> Result<()> {
    ctx.defer_or_broadcast().await?;
    match ctx.data().refresh_docs().await {
        Ok(index) => ctx.say(format!("Indexed {} entries.", index.len())).await?,
        Err(e @ DocsError::Unavailable) => ctx.say(e.to_string()).await?,
        Err(e) => return Err(e.into()),
    };
    Ok(())
}
