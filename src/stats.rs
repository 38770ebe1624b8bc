//! Index statistics.

use anyhow::Result;

use crate::app;
use crate::config::Config;

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let service = app::open_service(config).await?;
    let stats = service.index_stats().await?;

    let db_size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Positron — Index Stats");
    println!("======================");
    println!();
    println!("  Index:       {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Collection:  {}", stats.collection_name);
    println!("  Chunks:      {}", stats.total_chunks);
    println!(
        "  Embedding:   {} ({} dims)",
        config.embedding.model(),
        config.embedding.dims()
    );
    println!("  Generation:  {}", config.generation.model());

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
