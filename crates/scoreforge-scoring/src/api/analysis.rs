//! Score analysis types for detailed constraint tracking.
//!
//! This module provides types for analyzing constraint matches in detail,
//! including which facts are involved in each match, score explanations,
//! and fact-level indictments. They are only populated when constraint
//! match tracking is enabled and never influence the score itself.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use scoreforge_core::score::Score;
use scoreforge_core::{ConstraintRef, FactId, SolutionScore, Value};

/// A single live match of a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintMatch<Sc: Score> {
    /// Reference to the constraint that matched.
    pub constraint_ref: ConstraintRef,
    /// The tuple that matched, one value per tuple element.
    pub justification: Vec<Value>,
    /// Signed score impact of this match.
    pub score: Sc,
}

impl<Sc: Score> ConstraintMatch<Sc> {
    pub fn new(constraint_ref: ConstraintRef, justification: Vec<Value>, score: Sc) -> Self {
        Self {
            constraint_ref,
            justification,
            score,
        }
    }

    /// Facts referenced by the justification, including inside lists.
    pub fn indicted_facts(&self) -> Vec<FactId> {
        fn collect(value: &Value, out: &mut Vec<FactId>) {
            match value {
                Value::Ref(id) => {
                    if !out.contains(id) {
                        out.push(*id);
                    }
                }
                Value::List(items) => items.iter().for_each(|v| collect(v, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        self.justification.iter().for_each(|v| collect(v, &mut out));
        out
    }
}

impl<Sc: Score> fmt::Display for ConstraintMatch<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.constraint_ref)?;
        for (i, value) in self.justification.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "] = {}", self.score)
    }
}

/// Per-constraint aggregate of live matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintMatchTotal<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    /// Constraint weight (score per unit match weight).
    pub weight: Sc,
    /// Total score from this constraint.
    pub score: Sc,
    pub match_count: usize,
    /// Individual matches; empty unless match tracking is enabled.
    pub matches: Vec<ConstraintMatch<Sc>>,
}

impl<Sc: Score> ConstraintMatchTotal<Sc> {
    /// Returns the constraint name.
    pub fn name(&self) -> &str {
        &self.constraint_ref.name
    }

    /// Whether the weight has a non-zero hard level.
    pub fn is_hard(&self) -> bool {
        Sc::levels_count() > 1 && !(-self.weight.abs()).is_feasible()
    }
}

/// Complete score explanation with per-constraint breakdown.
#[derive(Debug, Clone)]
pub struct ScoreExplanation<Sc: Score> {
    /// The total score.
    pub score: SolutionScore<Sc>,
    /// Per-constraint breakdown, in constraint definition order.
    pub totals: Vec<ConstraintMatchTotal<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    pub fn new(score: SolutionScore<Sc>, totals: Vec<ConstraintMatchTotal<Sc>>) -> Self {
        Self { score, totals }
    }

    /// Returns the total match count across all constraints.
    pub fn total_match_count(&self) -> usize {
        self.totals.iter().map(|t| t.match_count).sum()
    }

    /// Returns constraints with non-zero scores.
    pub fn non_zero_constraints(&self) -> Vec<&ConstraintMatchTotal<Sc>> {
        self.totals.iter().filter(|t| !t.score.is_zero()).collect()
    }

    /// Returns all matches across all constraints.
    pub fn all_matches(&self) -> Vec<&ConstraintMatch<Sc>> {
        self.totals.iter().flat_map(|t| &t.matches).collect()
    }

    pub fn total(&self, constraint: &str) -> Option<&ConstraintMatchTotal<Sc>> {
        self.totals
            .iter()
            .find(|t| t.constraint_ref.full_name() == constraint)
    }
}

impl<Sc: Score> fmt::Display for ScoreExplanation<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explanation of score ({}):", self.score)?;
        for total in &self.totals {
            writeln!(
                f,
                "    {}: {} ({} matches)",
                total.constraint_ref, total.score, total.match_count
            )?;
            for m in &total.matches {
                writeln!(f, "        {}", m)?;
            }
        }
        Ok(())
    }
}

/// Analysis of how a single fact impacts the score.
#[derive(Debug, Clone)]
pub struct Indictment<Sc: Score> {
    /// The fact being analyzed.
    pub fact: FactId,
    /// Total score impact of matches involving this fact.
    pub score: Sc,
    /// Matches involving this fact, grouped by constraint.
    pub constraint_matches: HashMap<ConstraintRef, Vec<ConstraintMatch<Sc>>>,
}

impl<Sc: Score> Indictment<Sc> {
    pub fn new(fact: FactId) -> Self {
        Self {
            fact,
            score: Sc::zero(),
            constraint_matches: HashMap::new(),
        }
    }

    /// Adds a match to this indictment.
    pub fn add_match(&mut self, constraint_match: ConstraintMatch<Sc>) {
        self.score = self.score + constraint_match.score;
        self.constraint_matches
            .entry(constraint_match.constraint_ref.clone())
            .or_default()
            .push(constraint_match);
    }

    /// Returns the total number of matches involving this fact.
    pub fn match_count(&self) -> usize {
        self.constraint_matches.values().map(Vec::len).sum()
    }

    pub fn violated_constraints(&self) -> Vec<&ConstraintRef> {
        let mut refs: Vec<&ConstraintRef> = self.constraint_matches.keys().collect();
        refs.sort();
        refs
    }

    /// Returns the number of distinct constraints matched.
    pub fn constraint_count(&self) -> usize {
        self.constraint_matches.len()
    }
}

/// Map of fact indictments for analyzing which facts cause violations.
#[derive(Debug, Clone)]
pub struct IndictmentMap<Sc: Score> {
    pub indictments: HashMap<FactId, Indictment<Sc>>,
}

impl<Sc: Score> IndictmentMap<Sc> {
    pub fn new() -> Self {
        Self {
            indictments: HashMap::new(),
        }
    }

    /// Builds an indictment map from a collection of matches.
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a ConstraintMatch<Sc>>) -> Self {
        let mut map = Self::new();
        for m in matches {
            for fact in m.indicted_facts() {
                map.indictments
                    .entry(fact)
                    .or_insert_with(|| Indictment::new(fact))
                    .add_match(m.clone());
            }
        }
        map
    }

    pub fn get(&self, fact: FactId) -> Option<&Indictment<Sc>> {
        self.indictments.get(&fact)
    }

    /// Returns facts sorted by score impact (worst first).
    pub fn worst_facts(&self) -> Vec<FactId> {
        let mut facts: Vec<_> = self.indictments.keys().copied().collect();
        facts.sort_by(|a, b| {
            let sa = &self.indictments[a].score;
            let sb = &self.indictments[b].score;
            sa.cmp(sb).then_with(|| a.cmp(b))
        });
        facts
    }

    pub fn len(&self) -> usize {
        self.indictments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indictments.is_empty()
    }
}

impl<Sc: Score> Default for IndictmentMap<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

/// Difference between two sets of constraint matches.
///
/// Used by the assertion subsystem to localize a score corruption: `excess`
/// matches are held by the incremental network but not by a fresh one,
/// `missing` matches are the reverse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintMatchDiff {
    pub excess: Vec<String>,
    pub missing: Vec<String>,
}

impl ConstraintMatchDiff {
    pub fn between<Sc: Score>(
        working: &[ConstraintMatchTotal<Sc>],
        scratch: &[ConstraintMatchTotal<Sc>],
    ) -> Self {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for m in working.iter().flat_map(|t| &t.matches) {
            *counts.entry(m.to_string()).or_default() += 1;
        }
        for m in scratch.iter().flat_map(|t| &t.matches) {
            *counts.entry(m.to_string()).or_default() -= 1;
        }
        let mut diff = Self::default();
        for (rendered, count) in counts {
            let target = if count > 0 { &mut diff.excess } else { &mut diff.missing };
            for _ in 0..count.unsigned_abs() {
                target.push(rendered.clone());
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.excess.is_empty() && self.missing.is_empty()
    }
}
