//! Constraint weights replaced after the network is defined.

use std::collections::BTreeMap;

use scoreforge_core::Score;

/// Replacement weights keyed by full constraint name (`package/name`).
///
/// Weights are magnitudes: a penalized constraint stays a penalty. A zero
/// weight disables the constraint.
///
/// # Example
///
/// ```
/// use scoreforge_core::HardSoftScore;
/// use scoreforge_scoring::ConstraintWeightOverrides;
///
/// let overrides = ConstraintWeightOverrides::default()
///     .with_weight("Overtime", HardSoftScore::of_soft(5))
///     .with_weight("Overlap", HardSoftScore::ZERO);
/// assert_eq!(overrides.get("Overtime"), Some(HardSoftScore::of_soft(5)));
/// assert_eq!(overrides.names().collect::<Vec<_>>(), ["Overlap", "Overtime"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintWeightOverrides<Sc: Score> {
    weights: BTreeMap<String, Sc>,
}

impl<Sc: Score> Default for ConstraintWeightOverrides<Sc> {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }
}

impl<Sc: Score> ConstraintWeightOverrides<Sc> {
    /// Later pairs replace earlier ones with the same name.
    pub fn from_pairs<I, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, Sc)>,
        N: Into<String>,
    {
        Self {
            weights: pairs.into_iter().map(|(n, w)| (n.into(), w)).collect(),
        }
    }

    pub fn with_weight(mut self, name: impl Into<String>, weight: Sc) -> Self {
        self.weights.insert(name.into(), weight);
        self
    }

    pub fn get(&self, name: &str) -> Option<Sc> {
        self.weights.get(name).copied()
    }

    /// Overridden constraint names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
