use autofold_protocol::TermBag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Floor added to the max-normalised frequency by [`TfScheme::Augmented`].
pub const AUGMENTED_FLOOR: f64 = 0.4;
/// Share of the bag size that damps [`TfScheme::Saturating`].
pub const SATURATION_WEIGHT: f64 = 0.1;

/// Term-frequency weighting. Inverse document frequency is fixed at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfScheme {
    /// `0.4 + 0.6 * count / max_count`
    Augmented,
    /// `count / (count + 0.1 * total)`
    Saturating,
    /// `1 + ln(count)`
    #[default]
    Log,
    /// `(1 + ln(count)) / (1 + ln(avg_count))`
    LogAverage,
}

/// Bag-level frequencies some schemes normalise by.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BagShape {
    max: u32,
    total: usize,
    average: f64,
}

impl BagShape {
    fn of(bag: &TermBag) -> Self {
        let total = bag.total();
        let average = match bag.distinct() {
            0 => 0.0,
            distinct => total as f64 / distinct as f64,
        };
        Self {
            max: bag.iter().map(|(_, count)| count).max().unwrap_or(0),
            total,
            average,
        }
    }
}

impl TfScheme {
    fn weight(self, count: u32, shape: &BagShape) -> f64 {
        let count = count as f64;
        match self {
            TfScheme::Augmented => {
                AUGMENTED_FLOOR + (1.0 - AUGMENTED_FLOOR) * count / shape.max as f64
            }
            TfScheme::Saturating => count / (count + SATURATION_WEIGHT * shape.total as f64),
            TfScheme::Log => 1.0 + count.ln(),
            TfScheme::LogAverage => (1.0 + count.ln()) / (1.0 + shape.average.ln()),
        }
    }
}

/// Weighted term vector with its Euclidean norm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermVector {
    weights: BTreeMap<String, f64>,
    norm: f64,
}

impl TermVector {
    pub fn from_bag(bag: &TermBag, scheme: TfScheme) -> Self {
        let shape = BagShape::of(bag);
        let weights: BTreeMap<String, f64> = bag
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(term, count)| (term.to_string(), scheme.weight(count, &shape)))
            .collect();
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        Self { weights, norm }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn weight(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    /// Cosine of the angle between two vectors; 0 when either is empty.
    ///
    /// Walks the smaller vector and looks terms up in the larger one.
    pub fn cosine_similarity(&self, other: &TermVector) -> f64 {
        if self.is_empty() || other.is_empty() || self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .weights
            .iter()
            .map(|(term, w)| w * large.weight(term))
            .sum();
        (dot / (self.norm * other.norm)).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bag(terms: &[&str]) -> TermBag {
        terms.iter().copied().collect()
    }

    #[test]
    fn test_log_weights() {
        let v = TermVector::from_bag(&bag(&["a", "a", "a", "b"]), TfScheme::Log);
        assert!((v.weight("a") - (1.0 + 3f64.ln())).abs() < 1e-15);
        assert_eq!(v.weight("b"), 1.0);
        assert_eq!(v.weight("c"), 0.0);
    }

    #[test]
    fn test_empty_vectors_have_zero_similarity() {
        let empty = TermVector::from_bag(&TermBag::new(), TfScheme::Log);
        let full = TermVector::from_bag(&bag(&["x"]), TfScheme::Log);
        assert_eq!(empty.cosine_similarity(&full), 0.0);
        assert_eq!(full.cosine_similarity(&empty), 0.0);
        assert_eq!(empty.cosine_similarity(&empty), 0.0);
    }

    #[test]
    fn test_disjoint_and_partial_overlap() {
        let a = TermVector::from_bag(&bag(&["x", "y"]), TfScheme::Log);
        let b = TermVector::from_bag(&bag(&["z"]), TfScheme::Log);
        let c = TermVector::from_bag(&bag(&["y", "z"]), TfScheme::Log);
        assert_eq!(a.cosine_similarity(&b), 0.0);
        assert!((a.cosine_similarity(&c) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_augmented_scales_by_max_count() {
        // a: 4, b: 2, c: 1
        let b = bag(&["a", "a", "a", "a", "b", "b", "c"]);
        let v = TermVector::from_bag(&b, TfScheme::Augmented);
        assert!((v.weight("a") - 1.0).abs() < 1e-12);
        assert!((v.weight("b") - 0.7).abs() < 1e-12);
        assert!((v.weight("c") - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_saturating_damps_by_bag_size() {
        // 10 occurrences, so the damping term is 1
        let mut b = bag(&["x"; 4]);
        b.add_n("y", 6);
        let v = TermVector::from_bag(&b, TfScheme::Saturating);
        assert!((v.weight("x") - 4.0 / 5.0).abs() < 1e-12);
        assert!((v.weight("y") - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_average_divides_by_mean_frequency() {
        // two distinct terms over six occurrences: mean 3
        let b = bag(&["p", "p", "p", "p", "p", "q"]);
        let v = TermVector::from_bag(&b, TfScheme::LogAverage);
        let denom = 1.0 + 3f64.ln();
        assert!((v.weight("p") - (1.0 + 5f64.ln()) / denom).abs() < 1e-12);
        assert!((v.weight("q") - 1.0 / denom).abs() < 1e-12);
    }

    #[test]
    fn test_unit_bag_weighs_one_under_normalised_schemes() {
        let b = bag(&["solo"]);
        for scheme in [TfScheme::Augmented, TfScheme::Log, TfScheme::LogAverage] {
            assert_eq!(TermVector::from_bag(&b, scheme).weight("solo"), 1.0);
        }
    }

    fn arb_bag() -> impl Strategy<Value = TermBag> {
        prop::collection::vec("[a-e]", 1..12).prop_map(|terms| terms.into_iter().collect())
    }

    fn arb_scheme() -> impl Strategy<Value = TfScheme> {
        prop_oneof![
            Just(TfScheme::Augmented),
            Just(TfScheme::Saturating),
            Just(TfScheme::Log),
            Just(TfScheme::LogAverage),
        ]
    }

    proptest! {
        #[test]
        fn proptest_self_similarity_is_one(b in arb_bag(), scheme in arb_scheme()) {
            let v = TermVector::from_bag(&b, scheme);
            prop_assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-12);
        }

        #[test]
        fn proptest_similarity_in_unit_interval(
            a in arb_bag(),
            b in arb_bag(),
            scheme in arb_scheme(),
        ) {
            let va = TermVector::from_bag(&a, scheme);
            let vb = TermVector::from_bag(&b, scheme);
            let s = va.cosine_similarity(&vb);
            prop_assert!((0.0..=1.0).contains(&s));
            prop_assert_eq!(s, vb.cosine_similarity(&va));
        }

        #[test]
        fn proptest_weights_positive(b in arb_bag(), scheme in arb_scheme()) {
            let v = TermVector::from_bag(&b, scheme);
            for (term, _) in b.iter() {
                prop_assert!(v.weight(term) > 0.0);
            }
        }
    }
}
