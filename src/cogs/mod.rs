use tracing::debug;

use crate::{Commands, Context};

mod meta;
mod search;
mod utility;

pub struct Cog {
    pub commands: Commands,
    pub category: String,
}

impl Cog {
    pub fn new(commands: Commands, category: String) -> Self {
        Self { commands, category }
    }
}

// This is a hacky sort of cog framework around poise's commands.
pub fn commands() -> Commands {
    let cogs = [meta::cog(), utility::cog(), search::cog()];

    let mut result = vec![];
    for cog in cogs {
        for command in cog.commands {
            result.push(poise::Command {
                category: Some(cog.category.clone()),
                ..command
            });
        }
    }
    result
}

/// Removes the message that invoked a prefix command, if we are allowed to.
async fn delete_invocation(ctx: Context<'_>) {
    if let poise::Context::Prefix(prefix) = ctx {
        if let Err(e) = prefix.msg.delete(ctx).await {
            debug!("Could not delete invoking message: {e}");
        }
    }
}
