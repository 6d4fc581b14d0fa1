use anyhow::{bail, Result};

use super::trades::open_journal;
use super::{Context, ShareAction};
use crate::journal::parse_share_link;
use crate::view::{text, Message, TerminalSink, ViewSink};

fn visibility_message(public: bool) -> Message {
    if public {
        Message::ShareOn
    } else {
        Message::ShareOff
    }
}

pub async fn run(ctx: &Context, action: ShareAction) -> Result<()> {
    open_journal(ctx).await?;
    let locale = ctx.locale();

    match action {
        ShareAction::Status => {
            let public = ctx.app.share_status().await.map_err(|e| ctx.fail(e))?;
            println!("{}", text(locale, visibility_message(public)));
            if public {
                println!("{}", ctx.app.share_link().await.map_err(|e| ctx.fail(e))?);
            }
        }
        ShareAction::On | ShareAction::Off => {
            let public = matches!(action, ShareAction::On);
            ctx.app.set_sharing(public).await.map_err(|e| ctx.fail(e))?;
            println!("{}", text(locale, visibility_message(public)));
            if public {
                println!("{}", ctx.app.share_link().await.map_err(|e| ctx.fail(e))?);
            }
        }
        ShareAction::Link => {
            println!("{}", ctx.app.share_link().await.map_err(|e| ctx.fail(e))?);
        }
    }
    Ok(())
}

/// Read-only view of another user's journal
pub async fn view(ctx: &Context, target: &str) -> Result<()> {
    let Some(user_id) = parse_share_link(target) else {
        bail!("{}", text(ctx.locale(), Message::NotPublic));
    };

    ctx.app.start(Some(user_id)).await.map_err(|e| ctx.fail(e))?;

    let mut sink = TerminalSink::stdout();
    sink.commit(&ctx.app.view().await);
    Ok(())
}
