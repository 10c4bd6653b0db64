use crate::types::{Resource, ResourceKind};
use std::collections::HashMap;

/// Display and routing metadata for one resource kind. Loaded once as
/// static data, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct CategoryConfig {
    pub kind: ResourceKind,
    pub label: &'static str,
    pub description: &'static str,
    /// Sort priority, lower sorts first.
    pub priority: u8,
    /// Source names allowed to produce this kind; `search_by_kind` fans out
    /// to exactly these.
    pub sources: &'static [&'static str],
}

static CATEGORIES: [CategoryConfig; 4] = [
    CategoryConfig {
        kind: ResourceKind::Documentation,
        label: "Documentation",
        description: "Official docs, references, and guides",
        priority: 0,
        sources: &["mdn", "stackoverflow", "google"],
    },
    CategoryConfig {
        kind: ResourceKind::Repository,
        label: "Repositories",
        description: "Code repositories and packages",
        priority: 1,
        sources: &["github", "gitlab", "npm"],
    },
    CategoryConfig {
        kind: ResourceKind::Tutorial,
        label: "Tutorials",
        description: "Video tutorials and learning content",
        priority: 2,
        sources: &["youtube", "devto", "medium"],
    },
    CategoryConfig {
        kind: ResourceKind::Template,
        label: "Templates",
        description: "Starter templates and live examples",
        priority: 3,
        sources: &["github", "codesandbox", "codepen"],
    },
];

/// Config row for a kind.
pub fn config(kind: ResourceKind) -> &'static CategoryConfig {
    CATEGORIES
        .iter()
        .find(|c| c.kind == kind)
        .expect("every kind has a category row")
}

/// Sort priority for a kind (lower sorts first).
pub fn priority(kind: ResourceKind) -> u8 {
    config(kind).priority
}

/// All categories, ordered by priority.
pub fn all() -> Vec<&'static CategoryConfig> {
    let mut rows: Vec<_> = CATEGORIES.iter().collect();
    rows.sort_by_key(|c| c.priority);
    rows
}

/// True if `source` is registered as a producer of `kind`.
pub fn source_produces(source: &str, kind: ResourceKind) -> bool {
    config(kind).sources.contains(&source)
}

/// Stable sort by category priority; ties keep their relative order.
pub fn sort_by_priority(resources: &mut [Resource]) {
    resources.sort_by_key(|r| priority(r.kind));
}

/// Group a result list by kind, for display and counting.
pub fn group_by_kind(resources: &[Resource]) -> HashMap<ResourceKind, Vec<&Resource>> {
    let mut groups: HashMap<ResourceKind, Vec<&Resource>> = HashMap::new();
    for resource in resources {
        groups.entry(resource.kind).or_default().push(resource);
    }
    groups
}

/// Resources of a single kind, preserving order.
pub fn filter_by_kind<'a>(resources: &'a [Resource], kind: ResourceKind) -> Vec<&'a Resource> {
    resources.iter().filter(|r| r.kind == kind).collect()
}

/// Count per kind, with zero entries for kinds that produced nothing.
pub fn counts_by_kind(resources: &[Resource]) -> HashMap<ResourceKind, usize> {
    let mut counts: HashMap<ResourceKind, usize> =
        ResourceKind::ALL.iter().map(|k| (*k, 0)).collect();
    for resource in resources {
        *counts.entry(resource.kind).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_distinct_and_documentation_sorts_first() {
        let rows = all();
        assert_eq!(rows[0].kind, ResourceKind::Documentation);
        for pair in rows.windows(2) {
            assert!(pair[0].priority < pair[1].priority);
        }
    }

    #[test]
    fn every_kind_has_a_row_with_sources() {
        for kind in ResourceKind::ALL {
            assert!(!config(kind).sources.is_empty());
        }
    }

    #[test]
    fn sort_is_stable_within_a_kind() {
        let mut resources = vec![
            Resource::new("a", "a", "https://a", ResourceKind::Template),
            Resource::new("b", "b", "https://b", ResourceKind::Documentation),
            Resource::new("c", "c", "https://c", ResourceKind::Template),
        ];
        sort_by_priority(&mut resources);
        assert_eq!(resources[0].id, "b");
        assert_eq!(resources[1].id, "a");
        assert_eq!(resources[2].id, "c");
    }

    #[test]
    fn grouping_keeps_per_kind_order() {
        let resources = vec![
            Resource::new("a", "a", "https://a", ResourceKind::Tutorial),
            Resource::new("b", "b", "https://b", ResourceKind::Tutorial),
        ];
        let groups = group_by_kind(&resources);
        let tutorials = &groups[&ResourceKind::Tutorial];
        assert_eq!(tutorials.len(), 2);
        assert_eq!(tutorials[0].id, "a");
        assert_eq!(tutorials[1].id, "b");
    }

    #[test]
    fn counts_include_empty_kinds() {
        let resources = vec![Resource::new("a", "a", "https://a", ResourceKind::Repository)];
        let counts = counts_by_kind(&resources);
        assert_eq!(counts[&ResourceKind::Repository], 1);
        assert_eq!(counts[&ResourceKind::Tutorial], 0);
    }
}
