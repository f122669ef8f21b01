mod choose;
mod cogs;
mod config;
mod database;
mod docs;
mod embed_builder;
mod errors;
mod fuzzy;
mod google;
mod poll;
mod state;
mod translate;

use std::any::Any;

use config::Config;
use poise::{builtins, serenity_prelude as serenity, Framework, FrameworkOptions};
use state::Data;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// Common types
pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type Result<T> = anyhow::Result<T>;
pub type Commands = Vec<poise::Command<Data, Error>>;

/// Where a command is defined, injected into its `custom_data` by `#[inject_span]`.
pub struct Spanned {
    pub item: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub inner: Box<dyn Any + Send + Sync>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("utilitybot=info,warn")),
        )
        .init();

    if config.dev {
        info!("Starting bot in development configuration")
    } else {
        info!("Starting bot using main configuration")
    }

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;
    let token = config.bot_token.clone();

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: cogs::commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                mention_as_prefix: true,
                ..Default::default()
            },
            on_error: |e| Box::pin(errors::global_error_handler(e)),
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        command = %ctx.command().qualified_name,
                        author = %ctx.author().name,
                        "running command"
                    );
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
            Box::pin(async move {
                builtins::register_globally(ctx, &framework.options().commands).await?;
                Data::new(config)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to register ctrl-c handler: {e}");
            return;
        }
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}
