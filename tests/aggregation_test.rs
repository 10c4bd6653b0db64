use async_trait::async_trait;
use devassist_aggregator::{
    AggregatorError, Resource, ResourceAggregator, ResourceKind, SearchSource,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn resource(id: &str, url: &str, kind: ResourceKind, source: &str) -> Resource {
    Resource::new(id, format!("{id} title"), url, kind).with_source(source)
}

/// Returns a fixed result list for every query.
struct StaticSource {
    name: &'static str,
    kind: ResourceKind,
    resources: Vec<Resource>,
}

#[async_trait]
impl SearchSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn search(&self, _query: &str, limit: usize) -> devassist_aggregator::Result<Vec<Resource>> {
        Ok(self.resources.iter().take(limit).cloned().collect())
    }
}

struct FailingSource {
    name: &'static str,
}

#[async_trait]
impl SearchSource for FailingSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Documentation
    }

    async fn search(&self, _query: &str, _limit: usize) -> devassist_aggregator::Result<Vec<Resource>> {
        Err(AggregatorError::General("upstream unavailable".to_string()))
    }
}

/// Never completes within any realistic budget.
struct HangingSource;

#[async_trait]
impl SearchSource for HangingSource {
    fn name(&self) -> &'static str {
        "hanging"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Tutorial
    }

    async fn search(&self, _query: &str, _limit: usize) -> devassist_aggregator::Result<Vec<Resource>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Records the query it was invoked with.
struct RecordingSource {
    name: &'static str,
    kind: ResourceKind,
    queries: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SearchSource for RecordingSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn search(&self, query: &str, _limit: usize) -> devassist_aggregator::Result<Vec<Resource>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(vec![resource(
            "rec-1",
            &format!("https://example.com/{}", self.name),
            self.kind,
            self.name,
        )])
    }
}

#[tokio::test]
async fn merges_dedups_and_sorts_across_sources() {
    init_tracing();

    // github and npm both return the same URL; github registers first so
    // the merged list attributes it to github.
    let github = StaticSource {
        name: "github",
        kind: ResourceKind::Repository,
        resources: vec![
            resource(
                "github-1",
                "https://github.com/facebook/react",
                ResourceKind::Repository,
                "github",
            ),
            resource(
                "github-2",
                "https://github.com/vercel/next.js",
                ResourceKind::Repository,
                "github",
            ),
        ],
    };
    let npm = StaticSource {
        name: "npm",
        kind: ResourceKind::Repository,
        resources: vec![resource(
            "npm-react",
            "https://github.com/facebook/react",
            ResourceKind::Repository,
            "npm",
        )],
    };
    let mdn = StaticSource {
        name: "mdn",
        kind: ResourceKind::Documentation,
        resources: vec![resource(
            "mdn-1",
            "https://developer.mozilla.org/en-US/docs/Web/API",
            ResourceKind::Documentation,
            "mdn",
        )],
    };
    let broken = FailingSource { name: "stackoverflow" };

    let aggregator = ResourceAggregator::with_sources(vec![
        Arc::new(github),
        Arc::new(npm),
        Arc::new(mdn),
        Arc::new(broken),
    ]);

    let merged = aggregator.search_for_feature("react", 5).await.unwrap();

    // Duplicate URL collapsed, failing source contributed nothing.
    assert_eq!(merged.len(), 3);
    assert!(merged.iter().all(|r| r.source != "npm"));

    // Documentation (priority 0) sorts ahead of repositories (priority 1).
    assert_eq!(merged[0].kind, ResourceKind::Documentation);
    assert_eq!(merged[1].id, "github-1");
    assert_eq!(merged[2].id, "github-2");
}

#[tokio::test]
async fn all_sources_failing_yields_an_empty_list() {
    init_tracing();

    let aggregator = ResourceAggregator::with_sources(vec![
        Arc::new(FailingSource { name: "github" }),
        Arc::new(FailingSource { name: "mdn" }),
    ]);

    let merged = aggregator.search_for_feature("graphql", 3).await.unwrap();
    assert!(merged.is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_source_is_contained_by_the_per_source_timeout() {
    init_tracing();

    let healthy = StaticSource {
        name: "devto",
        kind: ResourceKind::Tutorial,
        resources: vec![resource(
            "devto-1",
            "https://dev.to/a/post",
            ResourceKind::Tutorial,
            "devto",
        )],
    };
    let aggregator =
        ResourceAggregator::with_sources(vec![Arc::new(HangingSource), Arc::new(healthy)])
            .with_source_timeout(Duration::from_secs(30));

    let merged = aggregator.search_for_feature("testing", 3).await.unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].id, "devto-1");
}

#[tokio::test]
async fn search_by_kind_restricts_sources_and_retags_results() {
    init_tracing();

    let template_queries = Arc::new(Mutex::new(Vec::new()));
    let github = RecordingSource {
        name: "github",
        kind: ResourceKind::Repository,
        queries: Arc::clone(&template_queries),
    };
    let youtube_queries = Arc::new(Mutex::new(Vec::new()));
    let youtube = RecordingSource {
        name: "youtube",
        kind: ResourceKind::Tutorial,
        queries: Arc::clone(&youtube_queries),
    };

    let aggregator = ResourceAggregator::with_sources(vec![Arc::new(github), Arc::new(youtube)]);

    let merged = aggregator
        .search_by_kind("dashboard", ResourceKind::Template, 3)
        .await
        .unwrap();

    // github is a registered template producer, youtube is not.
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].source, "github");
    assert_eq!(merged[0].kind, ResourceKind::Template);
    assert_eq!(
        template_queries.lock().unwrap().as_slice(),
        ["dashboard template"]
    );
    assert!(youtube_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn first_wins_dedup_is_deterministic_across_runs() {
    init_tracing();

    let build = || {
        ResourceAggregator::with_sources(vec![
            Arc::new(StaticSource {
                name: "github",
                kind: ResourceKind::Repository,
                resources: vec![resource(
                    "github-dup",
                    "https://github.com/shared/url",
                    ResourceKind::Repository,
                    "github",
                )],
            }) as Arc<dyn SearchSource>,
            Arc::new(StaticSource {
                name: "gitlab",
                kind: ResourceKind::Repository,
                resources: vec![resource(
                    "gitlab-dup",
                    "https://github.com/shared/url",
                    ResourceKind::Repository,
                    "gitlab",
                )],
            }),
        ])
    };

    for _ in 0..10 {
        let merged = build().search_for_feature("auth", 3).await.unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "github-dup");
    }
}

#[tokio::test]
async fn generate_feature_names_the_feature_and_attaches_resources() {
    init_tracing();

    let aggregator = ResourceAggregator::with_sources(vec![Arc::new(StaticSource {
        name: "mdn",
        kind: ResourceKind::Documentation,
        resources: vec![resource(
            "mdn-fetch",
            "https://developer.mozilla.org/en-US/docs/Web/API/fetch",
            ResourceKind::Documentation,
            "mdn",
        )],
    })]);

    let feature = aggregator.generate_feature("fetch").await.unwrap();
    assert_eq!(feature.name, "fetch");
    assert_eq!(feature.resources.len(), 1);
}
