use poise::{
    builtins,
    serenity_prelude::{CreateAttachment, ExecuteWebhook},
    FrameworkError,
};
use tracing::{error, warn};

use crate::{state::Data, Context, Error, Result};

async fn webhook_alert(
    ctx: Context<'_>,
    url: &str,
    e: &FrameworkError<'_, Data, Error>,
) -> Result<()> {
    let webhook = ctx.http().get_webhook_from_url(url).await?;

    let debug_output = format!("{e:?}");
    let payload = ExecuteWebhook::new()
        .content(format!("{e}"))
        .add_file(CreateAttachment::bytes(debug_output, "full_error.txt"));

    webhook.execute(ctx, true, payload).await?;
    Ok(())
}

/// Only failures inside the bot are worth an alert; bad user input is not.
fn is_alertable(e: &FrameworkError<'_, Data, Error>) -> bool {
    matches!(
        e,
        FrameworkError::Command { .. } | FrameworkError::CommandPanic { .. }
    )
}

pub async fn global_error_handler(e: FrameworkError<'_, Data, Error>) {
    match e.ctx() {
        Some(ctx) if is_alertable(&e) => match &ctx.data().config.webhook_url {
            Some(url) => {
                if let Err(failure) = webhook_alert(ctx, url, &e).await {
                    error!("Bot could not report errors to discord: {e}, {failure:?}")
                }
            }
            None => error!("Command failed: {e}"),
        },
        Some(_) => warn!("Command was not run: {e}"),
        None => error!("Bot could not report errors to discord: {e}"),
    }

    match e {
        FrameworkError::Setup { framework, .. } => {
            framework.shard_manager().shutdown_all().await;
        }
        _ => {
            if let Err(e) = builtins::on_error(e).await {
                error!("Error from the error handler: {e:?}");
            }
        }
    }
}
