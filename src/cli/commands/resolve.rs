use crate::domain::EntryKind;
use crate::state::SharedState;

pub async fn cmd_resolve(state: &SharedState, raw_id: &str) -> anyhow::Result<()> {
    let resolved = state.catalog.resolve_candidate(raw_id).await?;
    let details = &resolved.details;

    println!("{} ({})", details.title, resolved.kind);
    println!("{:-<60}", "");
    println!("  ID:       {}", resolved.id);
    if let Some(date) = &details.release_date {
        println!("  Released: {date}");
    }
    if let Some(seasons) = resolved.season_count {
        println!("  Seasons:  {seasons}");
    }
    if let Some(overview) = &details.overview {
        println!("  {overview}");
    }

    let other = match resolved.kind {
        EntryKind::Movie => resolved.series.as_ref().map(|d| ("series", d)),
        EntryKind::Series => resolved.movie.as_ref().map(|d| ("movie", d)),
    };
    if let Some((label, d)) = other {
        println!();
        println!("Also matches a {label}: {}", d.title);
    }

    Ok(())
}
