use crate::{Context, Result, Spanned};
use poise::{
    builtins::{autocomplete_command, HelpConfiguration},
    serenity_prelude as serenity, CreateReply,
};
use span_derive::inject_span;

use super::Cog;

pub fn cog() -> Cog {
    Cog::new(vec![help(), source()], "Meta".to_string())
}

struct CommandSummary<'a> {
    name: &'a str,
    description: Option<&'a str>,
    category: Option<&'a str>,
    hidden: bool,
}

/// Lists the visible commands of the category named `query`, if there is one.
fn category_overview<'a>(
    commands: impl IntoIterator<Item = CommandSummary<'a>>,
    query: &str,
    prefix: &str,
) -> Option<(String, String)> {
    let mut title = None;
    let mut lines = vec![];
    for command in commands {
        let Some(category) = command.category.filter(|c| c.eq_ignore_ascii_case(query)) else {
            continue;
        };
        title.get_or_insert_with(|| category.to_string());
        if command.hidden {
            continue;
        }
        lines.push(match command.description {
            Some(description) => format!("`{prefix}{}` {description}", command.name),
            None => format!("`{prefix}{}`", command.name),
        });
    }
    title.map(|title| (title, lines.join("\n")))
}

/// Get help on the bot, a category or a command
#[inject_span]
#[poise::command(prefix_command, slash_command)]
async fn help(
    ctx: Context<'_>,
    #[description = "Command or category to show help about"]
    #[autocomplete = "autocomplete_command"]
    command: Option<String>,
) -> Result<()> {
    if let Some(query) = command.as_deref() {
        let commands = &ctx.framework().options().commands;
        let summaries = commands.iter().map(|c| CommandSummary {
            name: &c.name,
            description: c.description.as_deref(),
            category: c.category.as_deref(),
            hidden: c.hide_in_help,
        });
        if let Some((title, body)) = category_overview(summaries, query, ctx.prefix()) {
            let embed = serenity::CreateEmbed::new()
                .color(ctx.data().config.default_embed_color)
                .title(title)
                .description(body);
            ctx.send(CreateReply::default().embed(embed)).await?;
            return Ok(());
        }
    }

    let config = HelpConfiguration {
        extra_text_at_bottom: "Type help <category> to list a category's commands.",
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}

fn source_link(span: &Spanned, repo: Option<&crate::state::Repo>) -> String {
    match repo {
        Some(repo) => format!(
            "[`{}`, line {}](<{}/blob/{}/{}#L{}>)",
            span.file, span.line, repo.url, repo.revision, span.file, span.line
        ),
        None => format!("`{}`, line {}", span.file, span.line),
    }
}

/// Fetch the source code of a command
#[inject_span]
#[poise::command(prefix_command, slash_command)]
async fn source(
    ctx: Context<'_>,
    #[description = "Command to show the source of"]
    #[autocomplete = "autocomplete_command"]
    command: String,
) -> Result<()> {
    if let Some(span) = ctx
        .framework()
        .options()
        .commands
        .iter()
        .find(|cmd| cmd.name == command || cmd.aliases.contains(&command))
        .and_then(|resolved| resolved.custom_data.downcast_ref::<Spanned>())
    {
        ctx.say(format!(
            "Command `{command}` (`{}`) is defined in {}",
            span.item,
            source_link(span, ctx.data().repo.as_ref())
        ))
        .await?;
    } else {
        ctx.say(format!("Command `{command}` not found")).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Repo;
    use pretty_assertions::assert_eq;

    fn summaries() -> Vec<CommandSummary<'static>> {
        vec![
            CommandSummary {
                name: "google",
                description: Some("Searches Google"),
                category: Some("Search"),
                hidden: false,
            },
            CommandSummary {
                name: "refresh",
                description: None,
                category: Some("Search"),
                hidden: true,
            },
            CommandSummary {
                name: "rtfm",
                description: None,
                category: Some("Search"),
                hidden: false,
            },
            CommandSummary {
                name: "help",
                description: Some("Get help"),
                category: Some("Meta"),
                hidden: false,
            },
        ]
    }

    #[test]
    fn lists_a_category_case_insensitively() {
        let (title, body) = category_overview(summaries(), "search", ".").unwrap();
        assert_eq!(title, "Search");
        assert_eq!(body, "`.google` Searches Google\n`.rtfm`");
    }

    #[test]
    fn unknown_category_falls_through() {
        assert!(category_overview(summaries(), "google", ".").is_none());
    }

    fn span() -> Spanned {
        Spanned {
            item: "google",
            file: "src/cogs/search.rs",
            line: 12,
            inner: Box::new(()),
        }
    }

    #[test]
    fn links_into_the_repository() {
        let repo = Repo {
            url: "https://github.com/owner/utilitybot".into(),
            revision: "abc123".into(),
        };
        assert_eq!(
            source_link(&span(), Some(&repo)),
            "[`src/cogs/search.rs`, line 12](<https://github.com/owner/utilitybot/blob/abc123/src/cogs/search.rs#L12>)"
        );
    }

    #[test]
    fn plain_location_without_repository() {
        assert_eq!(source_link(&span(), None), "`src/cogs/search.rs`, line 12");
    }
}
