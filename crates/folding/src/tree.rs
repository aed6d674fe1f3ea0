use crate::error::{FoldError, Result};
use autofold_protocol::{CharRange, LineSpan, Region, RegionKind, TermBag};

pub type NodeId = usize;

/// One foldable region inside a [`FoldableTree`].
#[derive(Debug, Clone)]
pub struct FoldableNode {
    id: NodeId,
    range: CharRange,
    lines: LineSpan,
    kind: RegionKind,
    terms: TermBag,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    unique_cost: usize,
    unfolded: bool,
}

impl FoldableNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn range(&self) -> CharRange {
        self.range
    }

    pub fn lines(&self) -> LineSpan {
        self.lines
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Terms owned by this node alone.
    pub fn terms(&self) -> &TermBag {
        &self.terms
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn loc(&self) -> usize {
        self.lines.loc()
    }

    /// Lines shown by revealing only this node while its children stay
    /// collapsed to one placeholder line each.
    pub fn unique_cost(&self) -> usize {
        self.unique_cost
    }

    pub fn is_unfolded(&self) -> bool {
        self.unfolded
    }
}

/// Arena of nested regions for one file, with the fold state and the
/// remaining line budget of one folding run.
///
/// Topology is frozen at construction; afterwards only the `unfolded` flags
/// (false → true) and the budget (downwards) change.
#[derive(Debug, Clone)]
pub struct FoldableTree {
    nodes: Vec<FoldableNode>,
    budget: usize,
}

impl FoldableTree {
    /// Builds and validates a tree from regions listed parent-first.
    ///
    /// Region 0 must be the root. Every other region must name an earlier
    /// region as parent, lie inside it, and follow its previous sibling
    /// without overlap. A node whose children span more lines than it does
    /// is rejected.
    pub fn from_regions(regions: Vec<Region>) -> Result<Self> {
        if regions.is_empty() {
            return Err(FoldError::structural("no regions: a tree needs a root"));
        }

        let mut nodes: Vec<FoldableNode> = Vec::with_capacity(regions.len());
        for (id, region) in regions.into_iter().enumerate() {
            if region.range.start > region.range.end || region.lines.start > region.lines.end {
                return Err(FoldError::structural(format!(
                    "region {id} has an inverted range {:?} / lines {:?}",
                    region.range, region.lines
                )));
            }

            let depth = match region.parent {
                None if id == 0 => 0,
                None => {
                    return Err(FoldError::structural(format!(
                        "region {id} has no parent but is not the first region"
                    )))
                }
                Some(_) if id == 0 => {
                    return Err(FoldError::structural("root region cannot have a parent"))
                }
                Some(parent) if parent >= id => {
                    return Err(FoldError::structural(format!(
                        "region {id} names parent {parent} which does not precede it"
                    )))
                }
                Some(parent) => {
                    let p = &nodes[parent];
                    if !p.range.contains(&region.range)
                        || region.lines.start < p.lines.start
                        || region.lines.end > p.lines.end
                    {
                        return Err(FoldError::structural(format!(
                            "region {id} {:?} escapes its parent {parent} {:?}",
                            region.range, p.range
                        )));
                    }
                    if let Some(&prev) = p.children.last() {
                        let prev = &nodes[prev];
                        if !prev.range.precedes(&region.range) || prev.lines.end > region.lines.start {
                            return Err(FoldError::structural(format!(
                                "region {id} {:?} overlaps or precedes its sibling {} {:?}",
                                region.range, prev.id, prev.range
                            )));
                        }
                    }
                    p.depth + 1
                }
            };

            if let Some(parent) = region.parent {
                nodes[parent].children.push(id);
            }
            nodes.push(FoldableNode {
                id,
                range: region.range,
                lines: region.lines,
                kind: region.kind,
                terms: region.terms,
                parent: region.parent,
                children: Vec::new(),
                depth,
                unique_cost: 0,
                unfolded: false,
            });
        }

        for id in 0..nodes.len() {
            let own = nodes[id].loc() as i64 - 1;
            let nested: i64 = nodes[id]
                .children
                .iter()
                .map(|&c| nodes[c].loc() as i64 - 1)
                .sum();
            let cost = own - nested;
            if cost < 0 {
                return Err(FoldError::structural(format!(
                    "region {id} has negative unique cost {cost} (lines {:?})",
                    nodes[id].lines
                )));
            }
            nodes[id].unique_cost = cost as usize;
        }

        Ok(Self { nodes, budget: 0 })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &FoldableNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&FoldableNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[FoldableNode] {
        &self.nodes
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Sets the line budget for the run this tree is handed to. The engine
    /// takes the tree by value, so the budget is fixed before the first
    /// round and only [`spend`](Self::spend) lowers it afterwards.
    #[must_use]
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Takes `cost` lines from the remaining budget.
    pub fn spend(&mut self, cost: usize) -> Result<()> {
        self.budget = self.budget.checked_sub(cost).ok_or_else(|| {
            FoldError::structural(format!("cost {cost} exceeds remaining budget {}", self.budget))
        })?;
        Ok(())
    }

    pub fn folded_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.unfolded).count()
    }

    /// Pre-order walk threading the pending reveal cost from parent to
    /// child.
    ///
    /// `visit` receives each node with the lines its reveal would cost now:
    /// its unique cost plus that of every folded ancestor up to the nearest
    /// unfolded one. Unfolded nodes report 0 and reset the accumulator for
    /// their subtree.
    pub fn traverse_lines_greedy(&self, mut visit: impl FnMut(&FoldableNode, usize)) {
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, pending)) = stack.pop() {
            let node = &self.nodes[id];
            let cost = if node.unfolded {
                0
            } else {
                pending + node.unique_cost
            };
            visit(node, cost);
            for &child in node.children.iter().rev() {
                stack.push((child, cost));
            }
        }
    }

    /// Current reveal cost of every folded node, in pre-order.
    pub fn reveal_costs(&self) -> Vec<(NodeId, usize)> {
        let mut costs = Vec::new();
        self.traverse_lines_greedy(|node, cost| {
            if !node.unfolded {
                costs.push((node.id, cost));
            }
        });
        costs
    }

    /// Marks `id` and its folded ancestors unfolded, returning the newly
    /// revealed ids from `id` upwards.
    pub fn reveal(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut revealed = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get_mut(current) else {
                break;
            };
            if node.unfolded {
                break;
            }
            node.unfolded = true;
            revealed.push(current);
            cursor = node.parent;
        }
        revealed
    }

    /// Ranges still folded whose parent is unfolded (or the root itself if
    /// folded): the fold markers a reader actually sees.
    pub fn outermost_folded(&self) -> Vec<CharRange> {
        self.nodes
            .iter()
            .filter(|n| !n.unfolded)
            .filter(|n| n.parent.map_or(true, |p| self.nodes[p].unfolded))
            .map(|n| n.range)
            .collect()
    }

    /// Every range not revealed, in id order.
    pub fn all_folded(&self) -> Vec<CharRange> {
        self.nodes
            .iter()
            .filter(|n| !n.unfolded)
            .map(|n| n.range)
            .collect()
    }
}
