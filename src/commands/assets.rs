use anyhow::Result;

use super::{AssetsAction, Context};
use crate::offline::{AssetRequest, WorkerEvent};
use crate::view::{text, Message};

pub async fn run(ctx: &Context, action: AssetsAction) -> Result<()> {
    let mut events = ctx.worker.subscribe();

    match action {
        AssetsAction::Install => {
            let report = ctx.worker.install().await;
            println!(
                "{}: {} cached, {} failed",
                ctx.worker.cache_name(),
                report.cached,
                report.failed
            );
        }
        AssetsAction::Activate => {
            let removed = ctx.worker.activate().await?;
            for name in &removed {
                println!("removed {}", name);
            }
        }
        AssetsAction::Get { url, navigate } => {
            let request = if navigate {
                AssetRequest::navigate(url)
            } else {
                AssetRequest::get(url)
            };
            let answer = ctx.worker.handle(&request).await?;
            println!(
                "{} {:?} {} bytes{}",
                answer.response.status,
                answer.source,
                answer.response.body.len(),
                answer
                    .response
                    .content_type
                    .as_deref()
                    .map(|ct| format!(" ({})", ct))
                    .unwrap_or_default()
            );
        }
    }

    while let Ok(event) = events.try_recv() {
        if let WorkerEvent::Updated { .. } = event {
            println!("{}", text(ctx.locale(), Message::CacheUpdated));
        }
    }
    Ok(())
}
