use crate::domain::EntryId;
use crate::services::{SyncProgress, SyncReport};
use crate::state::SharedState;
use tokio_util::sync::CancellationToken;

/// Cancels `token` on Ctrl-C so the running batch stops after its current unit.
fn cancel_on_ctrl_c(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nStopping after the current unit...");
            token.cancel();
        }
    });
}

fn print_progress(p: SyncProgress) {
    println!("[{}/{}] {}", p.current, p.total, p.message);
}

fn print_report(report: &SyncReport) {
    println!();
    println!(
        "Done: {} succeeded, {} failed, {} of {} attempted{}",
        report.succeeded,
        report.failed,
        report.attempted,
        report.total,
        if report.cancelled { " (cancelled)" } else { "" }
    );
}

pub async fn cmd_sync_series(state: &SharedState, raw_id: &str) -> anyhow::Result<()> {
    let id = EntryId::parse(raw_id)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    println!("Syncing seasons of {id}...");
    let report = state
        .catalog
        .sync_series_with(&id, &mut print_progress, &cancel)
        .await?;
    print_report(&report);

    Ok(())
}

pub async fn cmd_sync_all(state: &SharedState) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    println!("Syncing all catalog entries...");
    let report = state.catalog.sync_all(&mut print_progress, &cancel).await?;
    print_report(&report);

    Ok(())
}
