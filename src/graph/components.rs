use std::collections::HashSet;

use petgraph::unionfind::UnionFind;

use crate::graph::UserGraph;

/// Authors of the giant component: the single source of truth both the
/// final graph and the final cascades agree with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainedUsers {
    authors: HashSet<String>,
}

impl RetainedUsers {
    /// All nodes of `graph`.
    pub fn from_graph(graph: &UserGraph) -> Self {
        graph.authors().map(str::to_string).collect()
    }

    /// Whether `author` is retained.
    pub fn contains(&self, author: &str) -> bool {
        self.authors.contains(author)
    }

    /// Number of retained authors.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    /// Whether no author is retained.
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Iterate retained authors in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.authors.iter().map(String::as_str)
    }

    /// Retained authors sorted by name.
    pub fn sorted(&self) -> Vec<&str> {
        let mut v: Vec<_> = self.iter().collect();
        v.sort_unstable();
        v
    }
}

impl FromIterator<String> for RetainedUsers {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            authors: iter.into_iter().collect(),
        }
    }
}

/// Connected-component labelling of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentLabels {
    /// Component label of each node, indexed by node index. Labels are
    /// numbered in order of their lowest node index.
    pub labels: Vec<usize>,
    /// Node count of each component, indexed by label.
    pub sizes: Vec<usize>,
}

impl ComponentLabels {
    /// Number of components.
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Label of the largest component; ties go to the lowest label.
    pub fn largest(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (label, &size) in self.sizes.iter().enumerate() {
            if best.map_or(true, |(_, s)| size > s) {
                best = Some((label, size));
            }
        }
        best.map(|(label, _)| label)
    }
}

/// Result of giant-component extraction.
#[derive(Debug, Clone)]
pub struct GiantComponent {
    /// Authors of the winning component.
    pub retained: RetainedUsers,
    /// Edges with both endpoints in the winning component.
    pub graph: UserGraph,
    /// Number of components in the input graph.
    pub component_count: usize,
}

/// Giant connected component extraction.
#[derive(Debug)]
pub struct ComponentFilter;

impl ComponentFilter {
    /// Label connected components with a union-find over node indices.
    pub fn label(graph: &UserGraph) -> ComponentLabels {
        let n = graph.node_count();
        let mut uf: UnionFind<usize> = UnionFind::new(n);
        for (a, b, _) in graph.edges() {
            uf.union(a.index(), b.index());
        }

        let mut root_label: Vec<Option<usize>> = vec![None; n];
        let mut labels = Vec::with_capacity(n);
        let mut sizes: Vec<usize> = Vec::new();
        for node in 0..n {
            let root = uf.find_mut(node);
            let label = *root_label[root].get_or_insert_with(|| {
                sizes.push(0);
                sizes.len() - 1
            });
            sizes[label] += 1;
            labels.push(label);
        }

        ComponentLabels { labels, sizes }
    }

    /// Keep the largest connected component.
    ///
    /// Ties are broken in favour of the component holding the
    /// lexicographically smallest author. An empty graph yields an empty
    /// result.
    pub fn extract(graph: &UserGraph) -> GiantComponent {
        let components = Self::label(graph);
        let Some(giant) = components.largest() else {
            return GiantComponent {
                retained: RetainedUsers::default(),
                graph: graph.retain_edges(|_, _, _| false),
                component_count: 0,
            };
        };

        let labels = &components.labels;
        let giant_graph = graph.retain_edges(|a, _, _| labels[a.index()] == giant);
        let retained = RetainedUsers::from_graph(&giant_graph);

        tracing::info!(
            "giant component: {} of {} users in {} components, {} edges",
            retained.len(),
            graph.node_count(),
            components.count(),
            giant_graph.edge_count()
        );

        GiantComponent {
            retained,
            graph: giant_graph,
            component_count: components.count(),
        }
    }
}
