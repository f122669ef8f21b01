use std::time::Duration;

use poise::{serenity_prelude as serenity, CreateReply};
use span_derive::inject_span;
use tracing::{debug, info, warn};

use crate::{
    choose, database,
    embed_builder::{self, EmbedSpec},
    poll::{votes, PollRequest},
    translate::Translator,
    Context, Result, Spanned,
};

use super::{delete_invocation, Cog};

const PLAIN_EMBED_COLOR: u32 = 0x36393e;
const UNAVAILABLE_NOTICE_LIFETIME: Duration = Duration::from_secs(5);

pub fn cog() -> Cog {
    Cog::new(
        vec![translate(), langs(), embed(), choose(), rpoll()],
        "Utility".to_string(),
    )
}

/// Translate text!
#[inject_span]
#[poise::command(prefix_command, slash_command, aliases("trans"))]
async fn translate(
    ctx: Context<'_>,
    #[description = "Language name or code"] lang: String,
    #[description = "Text to translate"]
    #[rest]
    text: String,
) -> Result<()> {
    let code = {
        let conn = ctx.data().db.get()?;
        database::resolve_language(&conn, &lang)?
    };

    match code {
        Some(code) => {
            let data = ctx.data();
            let translated = Translator::new(&data.http, &data.config.translate_url)
                .translate(&text, &code)
                .await?;
            ctx.say(format!("*{translated}*")).await?;
        }
        None => {
            let notice = ctx.say("`Language not available.`").await?;
            tokio::time::sleep(UNAVAILABLE_NOTICE_LIFETIME).await;
            if let Err(e) = notice.delete(ctx).await {
                debug!("Could not delete language notice: {e}");
            }
        }
    }

    delete_invocation(ctx).await;
    Ok(())
}

/// Lists all available languages
#[inject_span]
#[poise::command(prefix_command, slash_command)]
async fn langs(
    ctx: Context<'_>,
    #[description = "Only list names matching this pattern"] pattern: Option<String>,
) -> Result<()> {
    let names = {
        let conn = ctx.data().db.get()?;
        database::language_names(&conn, pattern.as_deref())
    };
    let names = match names {
        Err(e) if e.is::<regex::Error>() => {
            ctx.say(format!("That pattern is invalid: {e}")).await?;
            return Ok(());
        }
        names => names?,
    };

    let description = if names.is_empty() {
        "*No languages match.*".to_string()
    } else {
        names.join(", ")
    };
    let embed = serenity::CreateEmbed::new()
        .color(serenity::Colour::BLUE)
        .title("Available Languages")
        .description(description);
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Makes you an embed
///
/// Plain text becomes the description. For more control, use sections like
/// `{title: Hello|description: World}{field: Name|value: Text|inline: false}{color: random}`.
/// Keys: title, description/desc, url, color/colour (hex, random or chosen), author, icon,
/// field, value, inline, thumbnail, image, footer and a bare {timestamp}.
#[inject_span]
#[poise::command(prefix_command, slash_command, user_cooldown = 3)]
async fn embed(
    ctx: Context<'_>,
    #[description = "Text or {key: value} sections"]
    #[rest]
    text: String,
) -> Result<()> {
    delete_invocation(ctx).await;

    let embed = if embed_builder::has_markup(&text) {
        let built = EmbedSpec::parse(&text).and_then(|spec| {
            spec.build(
                ctx.data().config.chosen_color,
                ctx.created_at(),
                &mut rand::thread_rng(),
            )
        });
        match built {
            Ok(embed) => embed,
            Err(e) => {
                ctx.say(e.to_string()).await?;
                return Ok(());
            }
        }
    } else {
        serenity::CreateEmbed::new()
            .description(&text)
            .color(PLAIN_EMBED_COLOR)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Requested by:\n{}",
                ctx.author().tag()
            )))
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Choose between multiple choices. Use `,` to separate choices.
#[inject_span]
#[poise::command(prefix_command, slash_command)]
async fn choose(
    ctx: Context<'_>,
    #[description = "Comma-separated choices"]
    #[rest]
    choices: String,
) -> Result<()> {
    let reply = match choose::pick(&choices, &mut rand::thread_rng()) {
        Ok(choice) => choice.to_string(),
        Err(e) => e.to_string(),
    };
    ctx.send(
        CreateReply::default()
            .content(reply)
            .allowed_mentions(serenity::CreateAllowedMentions::new()),
    )
    .await?;
    Ok(())
}

/// Create a poll using reactions.
///
/// `rpoll <question> | <answer> | <answer>` creates a poll with up to 9 answers.
/// Add `| time=<seconds>` to set how long the poll runs (30 seconds by default).
///
/// Example: `rpoll What time is it? | HAMMER TIME! | SHOWTIME! | time=10`
#[inject_span]
#[poise::command(prefix_command, slash_command)]
async fn rpoll(
    ctx: Context<'_>,
    #[description = "question | answer | answer [| time=seconds]"]
    #[rest]
    args: String,
) -> Result<()> {
    delete_invocation(ctx).await;

    let poll = match PollRequest::parse(&args) {
        Ok(poll) => poll,
        Err(e) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    let handle = ctx.say(poll.announcement()).await?;
    let message = handle.message().await?.into_owned();
    for emoji in poll.emoji() {
        let reaction = serenity::ReactionType::Unicode(emoji.to_string());
        if let Err(e) = message.react(ctx, reaction).await {
            warn!("Could not add poll reaction {emoji}: {e}");
        }
    }
    info!(
        answers = poll.answers.len(),
        seconds = poll.duration.as_secs(),
        "poll started"
    );

    tokio::time::sleep(poll.duration).await;

    let message = message.channel_id.message(ctx, message.id).await?;
    let counts: Vec<u64> = poll
        .emoji()
        .iter()
        .map(|emoji| {
            message
                .reactions
                .iter()
                .find(|r| {
                    matches!(&r.reaction_type, serenity::ReactionType::Unicode(s) if s.as_str() == *emoji)
                })
                .map_or(0, |r| votes(r.count, r.me))
        })
        .collect();

    ctx.say(poll.results(&counts)).await?;
    Ok(())
}
