//! # BK-Tree
//!
//! Metric tree for approximate word lookup. Every node stores a word and
//! indexes its children by their distance to that word; a range query
//! then prunes whole subtrees with the triangle inequality: when the
//! query is at distance `d` from a node, matches can only live under
//! edges in `[d - max, d + max]`.
//!
//! The tree is generic over the [`Metric`]; the default is Levenshtein.
//! Built once from the vocabulary, then searched through `&self`.

use crate::vocab::distance::{Levenshtein, Metric};
use hashbrown::HashMap;

const MAX_RESULTS: usize = 5;

#[derive(Debug)]
struct BkNode {
    word: String,
    children: HashMap<usize, BkNode>,
}

impl BkNode {
    fn new(word: String) -> Self {
        Self {
            word,
            children: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct BkTree<M: Metric = Levenshtein> {
    root: Option<BkNode>,
    metric: M,
    len: usize,
}

impl BkTree<Levenshtein> {
    pub fn new() -> Self {
        Self::with_metric(Levenshtein)
    }
}

impl Default for BkTree<Levenshtein> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> BkTree<M> {
    pub fn with_metric(metric: M) -> Self {
        Self {
            root: None,
            metric,
            len: 0,
        }
    }

    /// Number of distinct words stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Inserts a word: descend along the edge matching the distance to
    /// each node, creating a leaf at the first missing edge. Distance
    /// zero means the word is already present.
    pub fn insert(&mut self, word: &str) {
        let Some(root) = self.root.as_mut() else {
            self.root = Some(BkNode::new(word.to_string()));
            self.len = 1;
            return;
        };

        let mut node = root;
        loop {
            let distance = self.metric.distance(&node.word, word);
            if distance == 0 {
                return;
            }
            match node.children.entry(distance) {
                hashbrown::hash_map::Entry::Occupied(entry) => node = entry.into_mut(),
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(BkNode::new(word.to_string()));
                    self.len += 1;
                    return;
                }
            }
        }
    }

    /// Finds stored words within `max_distance` of the query, excluding
    /// exact matches. Results are ordered by distance, then length, then
    /// alphabetically, and capped at five.
    pub fn search(&self, query: &str, max_distance: usize) -> Vec<String> {
        let mut matches: Vec<(usize, String)> = Vec::new();
        if let Some(root) = &self.root {
            self.search_node(root, query, max_distance, &mut matches);
        }

        matches.sort_by(|(da, wa), (db, wb)| {
            da.cmp(db)
                .then(wa.chars().count().cmp(&wb.chars().count()))
                .then(wa.cmp(wb))
        });
        matches.truncate(MAX_RESULTS);
        matches.into_iter().map(|(_, word)| word).collect()
    }

    fn search_node(
        &self,
        node: &BkNode,
        query: &str,
        max_distance: usize,
        matches: &mut Vec<(usize, String)>,
    ) {
        let distance = self.metric.distance(&node.word, query);
        if distance > 0 && distance <= max_distance {
            matches.push((distance, node.word.clone()));
        }

        let lower = distance.saturating_sub(max_distance).max(1);
        let upper = distance + max_distance;
        for (&edge, child) in &node.children {
            if edge >= lower && edge <= upper {
                self.search_node(child, query, max_distance, matches);
            }
        }
    }
}
