use crate::cli::CatalogArgs;
use crate::error::Result;
use foldpost::core::catalog::Rank;
use foldpost::core::catalog::enrich::{CONFIDENCE_COLUMN, PTM_SCORE_COLUMN, enrich};
use foldpost::core::catalog::record::build_catalog;
use foldpost::core::catalog::table::Catalog;
use foldpost::engine::error::EngineError;
use std::fmt::Write;
use tracing::info;

pub fn run(args: CatalogArgs) -> Result<()> {
    info!("Cataloguing prediction folder {:?}", &args.folder);
    let mut catalog = build_catalog(&args.folder).map_err(EngineError::from)?;
    enrich(&mut catalog, &args.folder).map_err(EngineError::from)?;

    match &args.output {
        Some(path) => {
            catalog.write_csv_to_path(path).map_err(EngineError::from)?;
            println!("✓ Catalog of {} model(s) written to: {}", catalog.len(), path.display());
        }
        None if catalog.is_empty() => println!("No ranked models found in {}", args.folder.display()),
        None => print!("{}", render_table(&catalog)),
    }
    Ok(())
}

fn score(catalog: &Catalog, column: &str, rank: Rank) -> String {
    catalog
        .float(column, rank)
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

/// One line per model in catalog order.
pub fn render_table(catalog: &Catalog) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:>5}  {:>6}  {:>7}  {:>10}  {:>9}  name",
        "rank", "model", "seed", "relaxed", "confidence", "ptm_score"
    );
    for record in catalog.records() {
        let _ = writeln!(
            out,
            "{:>4}  {:>5}  {:>6}  {:>7}  {:>10}  {:>9}  {}",
            record.rank,
            record.model,
            record.seed,
            if record.relaxed { "yes" } else { "no" },
            score(catalog, CONFIDENCE_COLUMN, record.rank),
            score(catalog, PTM_SCORE_COLUMN, record.rank),
            record.name,
        );
    }
    out
}
