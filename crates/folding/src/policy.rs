use crate::error::{FoldError, Result};
use crate::tree::{FoldableNode, FoldableTree, NodeId};
use crate::vsm::{TermVector, TfScheme};
use autofold_protocol::{RegionKind, TermBag};
use autofold_topic_model::{DivergenceQuery, KlDivergenceKind, TopicModel};

/// What has been revealed so far in one folding run.
///
/// Updated once per round with the newly revealed nodes; adaptive oracles
/// score candidates relative to it.
#[derive(Debug, Clone, Default)]
pub struct RevealContext {
    revealed: Vec<NodeId>,
    revealed_terms: TermBag,
}

impl RevealContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revealed(&self) -> &[NodeId] {
        &self.revealed
    }

    pub fn revealed_terms(&self) -> &TermBag {
        &self.revealed_terms
    }

    pub fn record(&mut self, tree: &FoldableTree, ids: &[NodeId]) {
        for &id in ids {
            if let Some(node) = tree.node(id) {
                self.revealed.push(id);
                self.revealed_terms.merge(node.terms());
            }
        }
    }
}

/// Informativeness of a hypothetical revealed set.
pub enum ProfitOracle<'m> {
    /// Cosine similarity between the revealed terms and the whole file.
    Cosine {
        file_vector: TermVector,
        scheme: TfScheme,
    },
    /// Negated topic-model divergence of the revealed nodes.
    TopicDivergence(DivergenceQuery<'m>),
}

impl<'m> ProfitOracle<'m> {
    /// Vector-space oracle over the file's full term multiset.
    pub fn cosine(file_terms: &TermBag, scheme: TfScheme) -> Self {
        ProfitOracle::Cosine {
            file_vector: TermVector::from_bag(file_terms, scheme),
            scheme,
        }
    }

    /// Topic-model oracle for `file` of `project`; node ids must follow the
    /// order the model's corpus was built with.
    pub fn topic(
        model: &'m TopicModel,
        kind: KlDivergenceKind,
        backoff: usize,
        project: &str,
        file: &str,
    ) -> Result<Self> {
        Ok(ProfitOracle::TopicDivergence(DivergenceQuery::new(
            model, kind, backoff, project, file,
        )?))
    }

    /// Profit of revealing `node` on top of `context`.
    pub fn profit(&self, node: &FoldableNode, context: &RevealContext) -> Result<f64> {
        match self {
            ProfitOracle::Cosine {
                file_vector,
                scheme,
            } => {
                let mut candidate = context.revealed_terms().clone();
                candidate.merge(node.terms());
                let profit =
                    TermVector::from_bag(&candidate, *scheme).cosine_similarity(file_vector);
                if profit < 0.0 || profit.is_nan() {
                    return Err(FoldError::numeric(format!(
                        "similarity profit {profit} for node {} is not in [0, 1]",
                        node.id()
                    )));
                }
                Ok(profit)
            }
            ProfitOracle::TopicDivergence(query) => {
                let mut candidate = context.revealed().to_vec();
                candidate.push(node.id());
                Ok(-query.evaluate(&candidate)?)
            }
        }
    }
}

/// Rule used by the greedy engine to rank folded nodes each round.
pub enum Policy<'m> {
    /// `profit / cost`, profit measured by an oracle.
    ProfitPerCost(ProfitOracle<'m>),
    /// Shallower nodes first.
    ShallowestFirst,
    /// Nodes with more own terms first.
    LargestFirst,
    /// Documentation, then everything else, then function bodies.
    JavadocsFirst,
}

impl<'m> Policy<'m> {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::ProfitPerCost(ProfitOracle::Cosine { .. }) => "profit-per-cost/cosine",
            Policy::ProfitPerCost(ProfitOracle::TopicDivergence(_)) => "profit-per-cost/topic",
            Policy::ShallowestFirst => "shallowest-first",
            Policy::LargestFirst => "largest-first",
            Policy::JavadocsFirst => "javadocs-first",
        }
    }

    /// Score of revealing `node` at `cost` lines. Higher is better. Under
    /// `ProfitPerCost` a node without own terms scores −∞ and is never
    /// revealed on its own; the baselines rank it like any other node.
    pub fn score(&self, node: &FoldableNode, cost: usize, context: &RevealContext) -> Result<f64> {
        Ok(match self {
            Policy::ProfitPerCost(_) if node.terms().is_empty() => f64::NEG_INFINITY,
            Policy::ProfitPerCost(oracle) => oracle.profit(node, context)? / cost as f64,
            Policy::ShallowestFirst => -(node.depth() as f64),
            Policy::LargestFirst => node.terms().total() as f64,
            Policy::JavadocsFirst => documentation_rank(node),
        })
    }
}

fn documentation_rank(node: &FoldableNode) -> f64 {
    match node.kind() {
        RegionKind::Documentation => 2.0,
        _ if node.parent().is_none() => 1.0,
        RegionKind::FunctionBody => 0.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::region;
    use autofold_protocol::{CharRange, LineSpan, Region};

    fn tree() -> FoldableTree {
        FoldableTree::from_regions(vec![
            region(1, 30, None).with_terms(["main", "app"]),
            Region::new(
                CharRange::new(150, 260),
                LineSpan::new(2, 3),
                Some(0),
                RegionKind::Documentation,
            )
            .with_terms(["returns", "app"]),
            Region::new(
                CharRange::new(400, 999),
                LineSpan::new(4, 9),
                Some(0),
                RegionKind::FunctionBody,
            )
            .with_terms(["run", "loop", "loop"]),
            Region::new(
                CharRange::new(1100, 1999),
                LineSpan::new(11, 19),
                Some(0),
                RegionKind::TypeBody,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_baseline_scores() {
        let tree = tree();
        let ctx = RevealContext::new();
        let doc = tree.node(1).unwrap();
        let body = tree.node(2).unwrap();

        assert_eq!(Policy::ShallowestFirst.score(tree.root(), 9, &ctx).unwrap(), 0.0);
        assert_eq!(Policy::ShallowestFirst.score(body, 9, &ctx).unwrap(), -1.0);
        assert_eq!(Policy::LargestFirst.score(body, 9, &ctx).unwrap(), 3.0);
        assert_eq!(Policy::JavadocsFirst.score(doc, 1, &ctx).unwrap(), 2.0);
        assert_eq!(Policy::JavadocsFirst.score(tree.root(), 1, &ctx).unwrap(), 1.0);
        assert_eq!(Policy::JavadocsFirst.score(body, 1, &ctx).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_bag_scores_negative_infinity_under_profit() {
        let tree = tree();
        let ctx = RevealContext::new();
        let empty = tree.node(3).unwrap();
        let file_terms: TermBag = ["main", "app"].into_iter().collect();
        let policy = Policy::ProfitPerCost(ProfitOracle::cosine(&file_terms, TfScheme::Log));
        assert_eq!(policy.score(empty, 1, &ctx).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_baselines_rank_empty_bags() {
        let tree = tree();
        let ctx = RevealContext::new();
        let empty = tree.node(3).unwrap();
        assert_eq!(Policy::ShallowestFirst.score(empty, 1, &ctx).unwrap(), -1.0);
        assert_eq!(Policy::LargestFirst.score(empty, 1, &ctx).unwrap(), 0.0);
        assert_eq!(Policy::JavadocsFirst.score(empty, 1, &ctx).unwrap(), 1.0);
    }

    #[test]
    fn test_cosine_profit_uses_revealed_terms() {
        let tree = tree();
        let file_terms: TermBag = ["main", "app", "run", "loop", "loop"].into_iter().collect();
        let oracle = ProfitOracle::cosine(&file_terms, TfScheme::Log);
        let body = tree.node(2).unwrap();

        let alone = oracle.profit(body, &RevealContext::new()).unwrap();
        let mut ctx = RevealContext::new();
        ctx.record(&tree, &[0]);
        let with_root = oracle.profit(body, &ctx).unwrap();
        assert!(with_root > alone);
        assert!((0.0..=1.0).contains(&with_root));
        assert_eq!(ctx.revealed(), &[0]);
        assert_eq!(ctx.revealed_terms().total(), 2);
    }

    #[test]
    fn test_profit_per_cost_divides_by_cost() {
        let tree = tree();
        let file_terms: TermBag = ["run", "loop"].into_iter().collect();
        let policy = Policy::ProfitPerCost(ProfitOracle::cosine(&file_terms, TfScheme::Log));
        let body = tree.node(2).unwrap();
        let ctx = RevealContext::new();
        let at_one = policy.score(body, 1, &ctx).unwrap();
        let at_four = policy.score(body, 4, &ctx).unwrap();
        assert!((at_one / 4.0 - at_four).abs() < 1e-12);
        assert_eq!(policy.score(body, 0, &ctx).unwrap(), f64::INFINITY);
    }
}
