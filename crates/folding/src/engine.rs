use crate::error::Result;
use crate::policy::{Policy, RevealContext};
use crate::tree::{FoldableTree, NodeId};
use autofold_protocol::{CharRange, Region};
use serde::{Deserialize, Serialize};

/// A node revealed by the engine, with the round that revealed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedNode {
    pub id: NodeId,
    pub range: CharRange,
    pub round: usize,
}

/// Result of one folding run.
#[derive(Debug, Clone)]
pub struct FoldOutcome {
    tree: FoldableTree,
    revealed: Vec<RevealedNode>,
    initial_budget: usize,
    spent: usize,
    rounds: usize,
}

impl FoldOutcome {
    /// Final tree state, with `unfolded` flags set.
    pub fn tree(&self) -> &FoldableTree {
        &self.tree
    }

    /// Revealed nodes in reveal order; within a round the chosen node comes
    /// before the ancestors it pulled open.
    pub fn revealed(&self) -> &[RevealedNode] {
        &self.revealed
    }

    pub fn revealed_ranges(&self) -> Vec<CharRange> {
        self.revealed.iter().map(|r| r.range).collect()
    }

    /// Outermost ranges left folded. With nothing revealed this is the
    /// single whole-file range.
    pub fn folded(&self) -> Vec<CharRange> {
        self.tree.outermost_folded()
    }

    /// Every range left folded, nested ones included.
    pub fn all_folded(&self) -> Vec<CharRange> {
        self.tree.all_folded()
    }

    pub fn initial_budget(&self) -> usize {
        self.initial_budget
    }

    /// Lines charged across all rounds.
    pub fn spent(&self) -> usize {
        self.spent
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// 1-based line numbers hidden by the remaining folds.
    ///
    /// A folded region keeps its first line visible as the placeholder;
    /// a folded root hides the whole file.
    pub fn folded_lines(&self) -> Vec<usize> {
        let mut lines = Vec::new();
        for node in self.tree.nodes() {
            if node.is_unfolded() {
                continue;
            }
            let span = node.lines();
            let first = if node.parent().is_none() {
                span.start
            } else {
                span.start + 1
            };
            lines.extend(first..=span.end);
        }
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

/// Greedy budgeted unfolding: each round reveals the best-scoring folded
/// node whose reveal cost fits the remaining budget, together with its
/// folded ancestors.
pub struct UnfoldEngine<'p, 'm> {
    policy: &'p Policy<'m>,
}

impl<'p, 'm> UnfoldEngine<'p, 'm> {
    pub fn new(policy: &'p Policy<'m>) -> Self {
        Self { policy }
    }

    /// Runs rounds until no folded node is eligible and scores above −∞.
    ///
    /// Ties go to the node met first in pre-order. A zero budget leaves the
    /// whole file folded, zero-cost nodes included.
    pub fn run(&self, mut tree: FoldableTree) -> Result<FoldOutcome> {
        let initial_budget = tree.budget();
        let mut context = RevealContext::new();
        let mut revealed = Vec::new();
        let mut spent = 0;
        let mut rounds = 0;

        while initial_budget > 0 {
            let mut best: Option<(NodeId, usize)> = None;
            let mut best_score = f64::NEG_INFINITY;
            for (id, cost) in tree.reveal_costs() {
                if cost > tree.budget() {
                    continue;
                }
                let Some(node) = tree.node(id) else {
                    continue;
                };
                let score = self.policy.score(node, cost, &context)?;
                if score > best_score {
                    best_score = score;
                    best = Some((id, cost));
                }
            }

            let Some((winner, cost)) = best else {
                break;
            };
            tree.spend(cost)?;
            let newly = tree.reveal(winner);
            context.record(&tree, &newly);
            for &id in &newly {
                if let Some(node) = tree.node(id) {
                    revealed.push(RevealedNode {
                        id,
                        range: node.range(),
                        round: rounds,
                    });
                }
            }
            log::debug!(
                "{} round {rounds}: node {winner} (score {best_score:.6}, cost {cost}) revealed {} node(s), budget left {}",
                self.policy.name(),
                newly.len(),
                tree.budget()
            );
            spent += cost;
            rounds += 1;
        }

        log::debug!(
            "{}: {rounds} round(s), {spent}/{initial_budget} lines spent, {} of {} nodes still folded",
            self.policy.name(),
            tree.folded_count(),
            tree.len()
        );
        Ok(FoldOutcome {
            tree,
            revealed,
            initial_budget,
            spent,
            rounds,
        })
    }
}

/// Builds the tree for `regions` and reveals greedily within `budget`
/// lines under `policy`.
pub fn fold(regions: Vec<Region>, budget: usize, policy: &Policy<'_>) -> Result<FoldOutcome> {
    let tree = FoldableTree::from_regions(regions)?.with_budget(budget);
    UnfoldEngine::new(policy).run(tree)
}
