use crate::domain::EntryId;
use crate::services::RestoreOutcome;
use crate::state::SharedState;

pub async fn cmd_trash_list(state: &SharedState) -> anyhow::Result<()> {
    let items = state.catalog.list_trash().await?;

    if items.is_empty() {
        println!("Trash is empty.");
        return Ok(());
    }

    println!("{:<40} {:<8} {:<9} {}", "ID", "TYPE", "FROM", "TITLE");
    println!("{:-<80}", "");
    for item in &items {
        println!(
            "{:<40} {:<8} {:<9} {}",
            item.id, item.kind, item.origin, item.title
        );
        println!("    deleted {}", item.deleted_at);
    }

    Ok(())
}

pub async fn cmd_trash_add(state: &SharedState, id: &str, request: bool) -> anyhow::Result<()> {
    let snapshot = if request {
        state.catalog.trash_request(id).await?
    } else {
        let id = EntryId::parse(id)?;
        state.catalog.trash_entry(&id).await?
    };

    println!("✓ Moved '{}' to the trash", snapshot.title);
    Ok(())
}

pub async fn cmd_trash_restore(state: &SharedState, id: &str) -> anyhow::Result<()> {
    match state.catalog.restore(id).await? {
        RestoreOutcome::Restored(snapshot) => {
            println!("✓ Restored '{}' to {}", snapshot.title, snapshot.origin);
        }
        RestoreOutcome::NotFound => println!("Nothing with ID {id} in the trash."),
    }
    Ok(())
}

pub async fn cmd_trash_purge(state: &SharedState, id: &str) -> anyhow::Result<()> {
    if state.catalog.permanently_delete(id).await? {
        println!("✓ Permanently deleted {id}");
    } else {
        println!("Nothing with ID {id} in the trash.");
    }
    Ok(())
}

pub async fn cmd_trash_empty(state: &SharedState) -> anyhow::Result<()> {
    println!("Permanently delete everything in the trash?");
    println!("Enter 'y' to confirm, anything else to cancel:");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("y") {
        let count = state.catalog.empty_trash().await?;
        println!("✓ Deleted {count} records");
    } else {
        println!("Cancelled.");
    }
    Ok(())
}

pub async fn cmd_trash_cleanup(state: &SharedState) -> anyhow::Result<()> {
    let stats = state.catalog.purge_expired().await?;
    println!(
        "✓ Purged {} expired records ({} errors)",
        stats.removed, stats.errors
    );
    Ok(())
}
