//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateStats, Generator};
use crate::source::SourceSpec;
use crate::Site;

/// Pre-render the home page and every post
pub async fn run(site: &Site, spec: SourceSpec) -> Result<GenerateStats> {
    let start = std::time::Instant::now();
    tracing::info!("Generating from {:?}", spec);

    let generator = Generator::new(site, spec)?;
    let stats = generator.generate().await?;

    if stats.unavailable > 0 {
        tracing::warn!(
            "{} posts could not be loaded; previous pages were kept",
            stats.unavailable
        );
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        stats.posts,
        duration.as_secs_f64()
    );

    Ok(stats)
}
