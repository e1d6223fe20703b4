use crate::domain::EntryKind;
use crate::services::CandidateFilter;
use crate::state::SharedState;

pub async fn cmd_search(
    state: &SharedState,
    query: &str,
    kind: Option<EntryKind>,
    catalog_only: bool,
) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let filter = CandidateFilter {
        kind,
        in_catalog_only: catalog_only,
    };
    let results = state.catalog.search(query, filter).await?;

    if results.provider_degraded {
        println!("(provider unavailable, showing catalog matches only)");
    }

    if results.candidates.is_empty() {
        println!("Nothing found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("{:-<60}", "");

    for c in &results.candidates {
        let year = c
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .unwrap_or("????");
        let marker = if c.in_catalog { "*" } else { " " };

        println!("{marker} {} ({year}) [{}] ID: {}", c.title, c.kind, c.id);
        if c.admin_edited {
            println!("    curated");
        }
    }

    println!();
    println!("* = already in the catalog");

    Ok(())
}
