use std::collections::HashSet;
use tracing::debug;

/// Hard cap on features per description; each feature costs a full fan-out
/// across every source.
pub const MAX_FEATURES: usize = 8;

/// Emitted when nothing in the description matched, so the pipeline never
/// produces zero features.
const DEFAULT_FEATURES: [&str; 2] = ["frontend", "backend"];

/// Curated vocabulary: canonical feature name -> trigger substrings.
/// Triggers containing whitespace are matched as phrases before any
/// single-token matching. This is a heuristic layer; false positives and
/// negatives are expected and acceptable.
static VOCABULARY: &[(&str, &[&str])] = &[
    // Frameworks and languages
    ("react", &["react", "reactjs", "react.js"]),
    ("react native", &["react native"]),
    ("vue", &["vue", "vuejs", "vue.js", "nuxt"]),
    ("angular", &["angular"]),
    ("svelte", &["svelte"]),
    ("nextjs", &["nextjs", "next.js"]),
    ("nodejs", &["node", "nodejs", "node.js", "express"]),
    ("typescript", &["typescript"]),
    ("javascript", &["javascript"]),
    ("python", &["python", "django", "flask", "fastapi"]),
    ("rust", &["rust", "cargo"]),
    ("go", &["golang"]),
    ("flutter", &["flutter", "dart"]),
    // Data stores
    ("database", &["database", "storage", "sql", "nosql"]),
    ("postgresql", &["postgres", "postgresql"]),
    ("mysql", &["mysql", "mariadb"]),
    ("mongodb", &["mongodb", "mongo"]),
    ("redis", &["redis", "caching", "memcached"]),
    ("sqlite", &["sqlite"]),
    ("elasticsearch", &["elasticsearch", "full-text search"]),
    // APIs and messaging
    ("api", &["api", "endpoint", "rest", "openapi"]),
    ("graphql", &["graphql", "apollo"]),
    ("websockets", &["websocket", "websockets", "socket.io"]),
    ("messaging", &["kafka", "rabbitmq", "message queue", "pubsub"]),
    ("grpc", &["grpc", "protobuf"]),
    // Auth and security
    (
        "authentication",
        &["auth", "authentication", "login", "signup", "register", "jwt", "oauth", "sso"],
    ),
    ("security", &["security", "encryption", "csrf", "xss"]),
    // Cloud and operations
    ("aws", &["aws", "amazon web services", "lambda", "s3", "dynamodb"]),
    ("cloud", &["cloud", "azure", "gcp", "serverless"]),
    ("docker", &["docker", "container", "containers"]),
    ("kubernetes", &["kubernetes", "k8s", "helm"]),
    ("hosting", &["hosting", "deploy", "deployment", "vercel", "netlify"]),
    (
        "ci/cd",
        &["ci/cd", "continuous integration", "continuous deployment", "github actions", "pipeline"],
    ),
    // Product concerns
    ("frontend", &["frontend", "front-end", "ui", "interface", "design", "layout", "css", "tailwind"]),
    ("backend", &["backend", "back-end", "server", "microservice", "microservices"]),
    ("testing", &["testing", "tests", "jest", "cypress", "unit test", "e2e"]),
    ("payments", &["payment", "payments", "stripe", "checkout", "billing"]),
    ("search", &["search", "autocomplete"]),
    ("realtime", &["realtime", "real-time", "live updates"]),
    ("markdown", &["markdown"]),
    ("email", &["email", "smtp", "newsletter"]),
    (
        "machine learning",
        &["machine learning", "artificial intelligence", "llm", "embedding", "embeddings"],
    ),
    ("analytics", &["analytics", "dashboard", "metrics", "charts"]),
    ("mobile", &["mobile", "ios", "android"]),
];

/// Maps a free-text project description to a bounded set of feature names.
///
/// Matching runs in three passes: multi-word phrases first (matched text is
/// removed so "react native" doesn't also count as "react"), then single
/// tokens against the curated vocabulary, then a pattern fallback that
/// flags plausible technology tokens the vocabulary doesn't know. There is
/// no error path: any input yields at least one feature.
pub struct FeatureExtractor {
    vocabulary: &'static [(&'static str, &'static [&'static str])],
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            vocabulary: VOCABULARY,
        }
    }

    /// Swap in a different vocabulary table. The table is the part expected
    /// to grow without touching extraction logic.
    pub fn with_vocabulary(
        vocabulary: &'static [(&'static str, &'static [&'static str])],
    ) -> Self {
        Self { vocabulary }
    }

    pub fn extract(&self, description: &str) -> Vec<String> {
        let mut features: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let push = |seen: &mut HashSet<String>, features: &mut Vec<String>, name: &str| {
            if seen.insert(name.to_string()) {
                features.push(name.to_string());
            }
        };

        let mut lowered = description.to_lowercase();

        // Pass 1: multi-word phrases, longest first, removed greedily.
        let mut phrases: Vec<(&str, &str)> = self
            .vocabulary
            .iter()
            .flat_map(|(canonical, triggers)| {
                triggers
                    .iter()
                    .filter(|t| t.contains(char::is_whitespace))
                    .map(move |t| (*canonical, *t))
            })
            .collect();
        phrases.sort_by_key(|(_, trigger)| std::cmp::Reverse(trigger.len()));
        for (canonical, trigger) in phrases {
            if lowered.contains(trigger) {
                push(&mut seen, &mut features, canonical);
                lowered = lowered.replace(trigger, " ");
            }
        }

        // Pass 2: single tokens against the vocabulary.
        let tokens: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && !matches!(c, '.' | '+' | '#' | '-' | '/'))
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|t| !t.is_empty())
            .collect();
        for (canonical, triggers) in self.vocabulary {
            if triggers
                .iter()
                .filter(|t| !t.contains(char::is_whitespace))
                .any(|t| tokens.contains(t))
            {
                push(&mut seen, &mut features, canonical);
            }
        }

        // Pass 3: pattern fallback for unrecognized technology tokens,
        // scanning the original (non-lowercased) text. Tokens the
        // vocabulary already knows stay with their canonical name.
        let known_triggers: HashSet<&str> = self
            .vocabulary
            .iter()
            .flat_map(|(_, triggers)| triggers.iter().copied())
            .collect();
        for raw in description.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                continue;
            }
            let lower = token.to_lowercase();
            if seen.contains(&lower) || known_triggers.contains(lower.as_str()) {
                continue;
            }
            if looks_like_acronym(token) || has_technology_suffix(&lower) || is_proper_noun(token) {
                push(&mut seen, &mut features, &lower);
            }
        }

        features.truncate(MAX_FEATURES);

        if features.is_empty() {
            debug!("no features matched, falling back to defaults");
            for name in DEFAULT_FEATURES {
                push(&mut seen, &mut features, name);
            }
        }

        debug!("extracted {} feature(s): {:?}", features.len(), features);
        features
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Short all-caps tokens (JWT, SQL, AWS, CDN) read as technology acronyms.
fn looks_like_acronym(token: &str) -> bool {
    (2..=5).contains(&token.len()) && token.chars().all(|c| c.is_ascii_uppercase())
}

/// Common suffixes of technology names: the scripting-language extension
/// and the db/sql/api/sdk/cli families.
fn has_technology_suffix(token: &str) -> bool {
    const SUFFIXES: [&str; 6] = ["js", "db", "sql", "api", "sdk", "cli"];
    SUFFIXES
        .iter()
        .any(|suffix| token.len() > suffix.len() + 1 && token.ends_with(suffix))
}

/// Capitalized mid-sentence tokens (Postgres, Stripe, Kafka) are plausible
/// product names even when the vocabulary doesn't know them.
fn is_proper_noun(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            token.len() >= 4 && chars.all(|c| c.is_ascii_lowercase())
        }
        _ => false,
    }
}
