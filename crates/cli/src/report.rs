use autofold_folding::{FoldOutcome, FoldableNode};
use autofold_protocol::RegionKind;
use serde::Serialize;

/// One region as printed by `fold --json`, in 1-based lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    pub id: usize,
    pub kind: RegionKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl RegionReport {
    fn of(node: &FoldableNode) -> Self {
        let lines = node.lines();
        Self {
            id: node.id(),
            kind: node.kind(),
            start_line: lines.start,
            end_line: lines.end,
        }
    }
}

/// Result of folding a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FoldReport {
    pub file: String,
    pub language: String,
    pub policy: String,
    pub line_count: usize,
    pub budget: usize,
    pub spent: usize,
    pub rounds: usize,
    /// Lines hidden in the folded view, ascending
    pub folded_lines: Vec<usize>,
    /// Outermost folded regions
    pub folded: Vec<RegionReport>,
    /// Regions in the order they were unfolded
    pub revealed: Vec<RegionReport>,
}

impl FoldReport {
    pub fn new(
        file: String,
        language: &str,
        policy: &str,
        line_count: usize,
        outcome: &FoldOutcome,
    ) -> Self {
        let tree = outcome.tree();
        let folded = tree
            .nodes()
            .iter()
            .filter(|node| {
                !node.is_unfolded()
                    && node
                        .parent()
                        .and_then(|p| tree.node(p))
                        .map_or(true, FoldableNode::is_unfolded)
            })
            .map(RegionReport::of)
            .collect();
        let revealed = outcome
            .revealed()
            .iter()
            .filter_map(|r| tree.node(r.id))
            .map(RegionReport::of)
            .collect();

        Self {
            file,
            language: language.to_string(),
            policy: policy.to_string(),
            line_count,
            budget: outcome.initial_budget(),
            spent: outcome.spent(),
            rounds: outcome.rounds(),
            folded_lines: outcome.folded_lines(),
            folded,
            revealed,
        }
    }

    /// Folded line numbers, comma separated.
    pub fn folded_lines_text(&self) -> String {
        self.folded_lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofold_folding::{fold, Policy};
    use autofold_protocol::{CharRange, LineSpan, Region};
    use pretty_assertions::assert_eq;

    fn regions() -> Vec<Region> {
        vec![
            Region::new(CharRange::new(0, 99), LineSpan::new(1, 10), None, RegionKind::Root),
            Region::new(
                CharRange::new(10, 49),
                LineSpan::new(2, 5),
                Some(0),
                RegionKind::FunctionBody,
            ),
            Region::new(
                CharRange::new(60, 89),
                LineSpan::new(7, 9),
                Some(0),
                RegionKind::FunctionBody,
            ),
        ]
    }

    #[test]
    fn test_report_lists_outermost_folds() {
        let outcome = fold(regions(), 3, &Policy::ShallowestFirst).unwrap();
        let report = FoldReport::new("a.rs".into(), "rust", "shallowest", 10, &outcome);

        assert_eq!(report.revealed.len(), 1);
        assert_eq!(report.revealed[0].kind, RegionKind::Root);
        assert_eq!(
            report.folded.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(report.folded_lines_text(), "3,4,5,8,9");
    }

    #[test]
    fn test_zero_budget_folds_root() {
        let outcome = fold(regions(), 0, &Policy::LargestFirst).unwrap();
        let report = FoldReport::new("a.rs".into(), "rust", "largest", 10, &outcome);

        assert!(report.revealed.is_empty());
        assert_eq!(report.folded.len(), 1);
        assert_eq!(report.folded[0].kind, RegionKind::Root);
        assert_eq!(report.folded_lines.len(), 10);
    }
}
