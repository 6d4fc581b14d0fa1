use anyhow::{Context as _, Result};
use std::io::{self, BufRead, Write};

use super::{Context, Credentials};
use crate::api::SignUpOutcome;
use crate::app::ImportOutcome;
use crate::view::{text, Message};

fn read_password(creds: &Credentials) -> Result<String> {
    if let Some(password) = &creds.password {
        return Ok(password.clone());
    }
    eprint!("Password: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Offer the pre-account trades once the user has a session
async fn offer_import(ctx: &Context) -> Result<()> {
    let locale = ctx.locale();
    let prompt = ctx.prompt();
    match ctx.app.import_legacy(prompt.as_ref()).await {
        Ok(ImportOutcome::Imported(count)) => {
            log::info!("Imported {} legacy trades", count);
            println!("{}", text(locale, Message::ImportDone));
        }
        Ok(ImportOutcome::Declined) | Ok(ImportOutcome::NothingToImport) => {}
        Err(e) => eprintln!("{}", crate::view::describe(locale, &e)),
    }
    Ok(())
}

pub async fn login(ctx: &Context, creds: Credentials) -> Result<()> {
    let locale = ctx.locale();
    let password = read_password(&creds)?;

    eprintln!("{}", text(locale, Message::SigningIn));
    ctx.app
        .sign_in(&creds.email, &password)
        .await
        .map_err(|e| ctx.fail(e))?;
    println!("{}", text(locale, Message::SignedIn));

    offer_import(ctx).await
}

pub async fn signup(ctx: &Context, creds: Credentials) -> Result<()> {
    let locale = ctx.locale();
    let password = read_password(&creds)?;

    eprintln!("{}", text(locale, Message::CreatingAccount));
    let outcome = ctx
        .app
        .sign_up(&creds.email, &password)
        .await
        .map_err(|e| ctx.fail(e))?;

    match outcome {
        SignUpOutcome::SignedIn(_) => {
            println!("{}", text(locale, Message::AccountCreated));
            offer_import(ctx).await
        }
        SignUpOutcome::ConfirmationRequired(_) => {
            println!("{}", text(locale, Message::CheckEmail));
            Ok(())
        }
    }
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.app.sign_out().await;
    println!("{}", text(ctx.locale(), Message::SignedOut));
    Ok(())
}
