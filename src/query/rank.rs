use std::collections::HashSet;

use crate::graph::node::CodeNode;

/// Number of nodes kept after ranking.
pub const TOP_K: usize = 5;

/// A node together with the number of distinct keywords it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedNode {
    pub node: CodeNode,
    pub score: usize,
}

fn matches(keyword: &str, name: &str, path: &str) -> bool {
    name.contains(keyword) || path.contains(keyword)
}

/// Score and order `nodes` against `keywords`, keeping the top [`TOP_K`].
///
/// A node is a candidate when any keyword is a substring of its lowercased name
/// or file path. Its score is the number of distinct keywords that match. The
/// sort is stable, so equal scores keep the iteration order of `nodes` (the
/// store's insertion order); callers rely on that tie-break.
pub fn rank<'a, I>(nodes: I, keywords: &[String]) -> Vec<RankedNode>
where
    I: IntoIterator<Item = &'a CodeNode>,
{
    rank_top(nodes, keywords, TOP_K)
}

/// [`rank`] with an explicit result limit.
pub fn rank_top<'a, I>(nodes: I, keywords: &[String], limit: usize) -> Vec<RankedNode>
where
    I: IntoIterator<Item = &'a CodeNode>,
{
    let mut distinct: Vec<&str> = Vec::new();
    for kw in keywords {
        if !distinct.contains(&kw.as_str()) {
            distinct.push(kw);
        }
    }
    if distinct.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut candidates: Vec<RankedNode> = Vec::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        let name = node.name.to_lowercase();
        let path = node.file_path.to_lowercase();
        let score = distinct
            .iter()
            .filter(|kw| matches(kw, &name, &path))
            .count();
        if score > 0 {
            candidates.push(RankedNode {
                node: node.clone(),
                score,
            });
        }
    }

    // Vec::sort_by is stable.
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{NodeKind, Position, symbol_id};

    fn sym(file: &str, name: &str) -> CodeNode {
        CodeNode {
            id: symbol_id(file, &[], name),
            kind: NodeKind::Function,
            name: name.into(),
            file_path: file.into(),
            start: Position::new(1, 0),
            end: Position::new(1, 0),
            exports: Vec::new(),
            summary: None,
        }
    }

    fn kws(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn ids(ranked: &[RankedNode]) -> Vec<&str> {
        ranked.iter().map(|r| r.node.id.as_str()).collect()
    }

    #[test]
    fn test_name_substring_match_ranks_symbol() {
        let nodes = vec![
            CodeNode::file("a.ts", 3),
            sym("a.ts", "getUser"),
            sym("b.ts", "formatDate"),
        ];
        let ranked = rank(&nodes, &kws(&["rename", "getuser"]));
        assert_eq!(ids(&ranked), vec!["a.ts:getUser"]);
        assert_eq!(ranked[0].score, 1);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let nodes = vec![
            CodeNode::file("x.ts", 1),
            sym("x.ts", "helper"),
            CodeNode::file("y.ts", 1),
            sym("y.ts", "helper"),
        ];
        let ranked = rank(&nodes, &kws(&["helper"]));
        assert_eq!(ids(&ranked), vec!["x.ts:helper", "y.ts:helper"]);
    }

    #[test]
    fn test_score_counts_distinct_keywords_over_name_and_path() {
        let nodes = vec![sym("src/user/api.ts", "fetchProfile"), sym("src/user.ts", "load")];
        let ranked = rank(&nodes, &kws(&["user", "profile", "api", "user"]));
        assert_eq!(ids(&ranked), vec!["src/user/api.ts:fetchProfile", "src/user.ts:load"]);
        assert_eq!(ranked[0].score, 3);
        assert_eq!(ranked[1].score, 1);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let nodes: Vec<_> = (0..12).map(|i| sym("m.ts", &format!("item{i}"))).collect();
        let ranked = rank(&nodes, &kws(&["item"]));
        assert_eq!(ranked.len(), TOP_K);
        assert_eq!(ranked[0].node.name, "item0");
    }

    #[test]
    fn test_no_keywords_or_no_match_is_empty() {
        let nodes = vec![sym("a.ts", "foo")];
        assert!(rank(&nodes, &[]).is_empty());
        assert!(rank(&nodes, &kws(&["zzz"])).is_empty());
    }

    #[test]
    fn test_repeated_ranking_is_deterministic() {
        let nodes: Vec<_> = ["alpha", "beta_alpha", "gamma", "alphabet"]
            .iter()
            .map(|n| sym("g.ts", n))
            .collect();
        let keywords = kws(&["alpha", "bet"]);
        let first = rank(&nodes, &keywords);
        for _ in 0..10 {
            assert_eq!(rank(&nodes, &keywords), first);
        }
    }
}
