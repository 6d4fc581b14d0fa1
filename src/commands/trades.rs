use anyhow::{Context as _, Result};
use std::fs::File;
use std::path::Path;

use super::{Context, TradeArgs};
use crate::app::JournalError;
use crate::journal::TradeForm;
use crate::view::{text, Message, TerminalSink, ViewSink};

/// Resume the stored session and load the owner's trades
pub(super) async fn open_journal(ctx: &Context) -> Result<()> {
    if let Err(e) = ctx.app.start(None).await {
        // load failures leave a banner in the view
        log::warn!("Journal did not load: {}", e);
    }
    if !ctx.app.snapshot().await.session.is_authenticated() {
        return Err(ctx.fail(JournalError::NotSignedIn));
    }
    Ok(())
}

/// Overwrite the form fields that were given on the command line
fn apply(form: &mut TradeForm, args: TradeArgs) {
    let fields = [
        (&mut form.pair, args.pair),
        (&mut form.date, args.date),
        (&mut form.session, args.session),
        (&mut form.direction, args.direction),
        (&mut form.setup, args.setup),
        (&mut form.tradingview_url, args.url),
        (&mut form.risk, args.risk),
        (&mut form.rr, args.rr),
        (&mut form.result, args.result),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            *field = value;
        }
    }
}

async fn show(ctx: &Context, notice: Option<Message>) {
    let mut sink = TerminalSink::stdout();
    sink.commit(&ctx.app.view().await);
    if let Some(message) = notice {
        sink.notify(&text(ctx.locale(), message));
    }
}

pub async fn list(ctx: &Context) -> Result<()> {
    open_journal(ctx).await?;
    show(ctx, None).await;
    Ok(())
}

pub async fn add(ctx: &Context, args: TradeArgs) -> Result<()> {
    open_journal(ctx).await?;

    let mut form = TradeForm::blank(chrono::Local::now().date_naive());
    apply(&mut form, args);
    ctx.app.add_trade(&form).await.map_err(|e| ctx.fail(e))?;

    show(ctx, Some(Message::TradeSaved)).await;
    Ok(())
}

pub async fn edit(ctx: &Context, row: usize, args: TradeArgs) -> Result<()> {
    open_journal(ctx).await?;

    let trade = ctx.app.trade_at(row).await.map_err(|e| ctx.fail(e))?;
    let mut form = TradeForm::from_trade(&trade);
    apply(&mut form, args);
    ctx.app
        .edit_trade(&trade.id, &form)
        .await
        .map_err(|e| ctx.fail(e))?;

    show(ctx, Some(Message::TradeSaved)).await;
    Ok(())
}

pub async fn delete(ctx: &Context, row: usize) -> Result<()> {
    open_journal(ctx).await?;

    let trade = ctx.app.trade_at(row).await.map_err(|e| ctx.fail(e))?;
    let prompt = ctx.prompt();
    let deleted = ctx
        .app
        .delete_trade(&trade.id, prompt.as_ref())
        .await
        .map_err(|e| ctx.fail(e))?;

    if deleted {
        show(ctx, Some(Message::TradeDeleted)).await;
    }
    Ok(())
}

pub async fn export(ctx: &Context, path: &Path) -> Result<()> {
    open_journal(ctx).await?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = ctx.app.export_csv(file).await.map_err(|e| ctx.fail(e))?;
    log::info!("Exported {} trades to {}", count, path.display());
    println!("{} -> {}", count, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut form = TradeForm {
            pair: "EURUSD".to_string(),
            risk: "1".to_string(),
            result: "Stop".to_string(),
            ..TradeForm::default()
        };
        apply(
            &mut form,
            TradeArgs {
                risk: Some("2".to_string()),
                result: Some("Take".to_string()),
                ..TradeArgs::default()
            },
        );

        assert_eq!(form.pair, "EURUSD");
        assert_eq!(form.risk, "2");
        assert_eq!(form.result, "Take");
    }
}
