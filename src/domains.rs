//! Domain input table loading.
//!
//! The collect stage is driven by an operator-maintained CSV of news
//! domains and their Google News publication tokens. The table is
//! configuration, so any defect in it (missing file, missing columns, a
//! short row) fails the run at startup rather than being skipped.
//!
//! Values here are bare domains and opaque tokens, so a simple
//! comma-split parse is sufficient; there is no quoting in this table.

use crate::models::DomainRow;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Load and validate the domain table.
///
/// The header must contain `domain` and `gnews_pub_token` columns (any
/// order, extra columns ignored). Blank lines are skipped.
pub async fn load_domains(path: &Path) -> Result<Vec<DomainRow>, Box<dyn Error>> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| format!("cannot read domain table {}: {e}", path.display()))?;

    let mut lines = contents.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => return Err(format!("domain table {} is empty", path.display()).into()),
        }
    };

    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let domain_idx = column_index(&columns, "domain", path)?;
    let token_idx = column_index(&columns, "gnews_pub_token", path)?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(domain), Some(token)) = (fields.get(domain_idx), fields.get(token_idx)) else {
            return Err(format!(
                "domain table {} line {}: expected at least {} columns",
                path.display(),
                line_no + 1,
                domain_idx.max(token_idx) + 1
            )
            .into());
        };
        if domain.is_empty() || token.is_empty() {
            return Err(format!(
                "domain table {} line {}: empty domain or token",
                path.display(),
                line_no + 1
            )
            .into());
        }
        rows.push(DomainRow {
            domain: (*domain).to_string(),
            gnews_pub_token: (*token).to_string(),
        });
    }

    info!(rows = rows.len(), path = %path.display(), "Loaded domain table");
    Ok(rows)
}

fn column_index(columns: &[&str], name: &str, path: &Path) -> Result<usize, Box<dyn Error>> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or_else(|| format!("domain table {} is missing a '{name}' column", path.display()).into())
}
