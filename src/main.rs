use clap::Parser;
use devassist_aggregator::categories;
use devassist_aggregator::{
    ApiConfig, FeatureExtractor, ResourceAggregator, ResourceKind, DEFAULT_PER_SOURCE_LIMIT,
};
use tracing::{info, warn};

/// Turn a project description into a categorized list of developer
/// resources gathered from public APIs.
#[derive(Parser, Debug)]
#[command(name = "devassist", version, about)]
struct Args {
    /// Free-form project description, e.g. "A React app with Postgres and JWT auth"
    description: String,

    /// Maximum results requested from each source per feature
    #[arg(long, default_value_t = DEFAULT_PER_SOURCE_LIMIT)]
    per_source_limit: usize,

    /// Restrict the search to one resource kind
    /// (repository, documentation, tutorial, template)
    #[arg(long)]
    kind: Option<ResourceKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = ApiConfig::from_env();
    let aggregator = ResourceAggregator::new(&config);
    let extractor = FeatureExtractor::new();

    let features = extractor.extract(&args.description);
    info!("extracted features: {}", features.join(", "));

    for feature in &features {
        let resources = match args.kind {
            Some(kind) => {
                aggregator
                    .search_by_kind(feature, kind, args.per_source_limit)
                    .await?
            }
            None => {
                aggregator
                    .search_for_feature(feature, args.per_source_limit)
                    .await?
            }
        };

        if resources.is_empty() {
            warn!("no resources found for \"{}\"", feature);
            continue;
        }

        println!("\n## {feature}");
        for category in categories::all() {
            let group = categories::filter_by_kind(&resources, category.kind);
            if group.is_empty() {
                continue;
            }
            println!("\n  {} ({}):", category.kind, group.len());
            for resource in group {
                println!("    - {} <{}>", resource.title, resource.url);
                if let Some(description) = &resource.description {
                    println!("      {description}");
                }
            }
        }
    }

    Ok(())
}
