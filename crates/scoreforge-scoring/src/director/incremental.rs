//! Incremental score director backed by the tuple network.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use scoreforge_config::{EnvironmentMode, LookUpStrategyType};
use scoreforge_core::domain::{
    ClassId, ClassKind, Fact, FactId, FieldKind, FieldRef, SolutionSchema, WorkingSolution,
};
use scoreforge_core::{ConfigurationError, Score, SolutionScore, UsageError, Value};
use tracing::{error, info, trace, warn};

use super::factory::ScoreDirectorFactory;
use super::lookup::LookUp;
use super::pending::{PendingChange, PendingChanges};
use super::traits::ScoreDirector;
use crate::api::analysis::{
    ConstraintMatchDiff, ConstraintMatchTotal, IndictmentMap, ScoreExplanation,
};
use crate::error::{
    Result, ScoreCorruptionError, ScoreDirectorError, ShadowVariableStaleError, StaleShadow,
};
use crate::moves::Move;
use crate::network::TupleNetwork;
use crate::shadow::ShadowEngine;

/// Before hooks still waiting for their after hook.
#[derive(Debug, Default)]
struct OpenHooks {
    adding_entities: Vec<ClassId>,
    adding_facts: Vec<ClassId>,
    changing: HashMap<(FactId, FieldRef), usize>,
    changing_facts: HashMap<FactId, usize>,
    removing_entities: HashSet<FactId>,
    removing_facts: HashSet<FactId>,
}

fn open<K: std::hash::Hash + Eq>(counts: &mut HashMap<K, usize>, key: K) {
    *counts.entry(key).or_default() += 1;
}

fn close<K: std::hash::Hash + Eq>(counts: &mut HashMap<K, usize>, key: K) -> bool {
    match counts.get_mut(&key) {
        Some(1) => {
            counts.remove(&key);
            true
        }
        Some(n) => {
            *n -= 1;
            true
        }
        None => false,
    }
}

fn close_class(classes: &mut Vec<ClassId>, class: ClassId) -> bool {
    match classes.iter().position(|&c| c == class) {
        Some(i) => {
            classes.swap_remove(i);
            true
        }
        None => false,
    }
}

/// Uninitialized genuine variables per entity, as of the last settle.
#[derive(Debug, Default)]
struct InitTracker {
    per_entity: HashMap<FactId, usize>,
    total: usize,
}

impl InitTracker {
    fn set(&mut self, entity: FactId, count: usize) {
        let old = if count == 0 {
            self.per_entity.remove(&entity)
        } else {
            self.per_entity.insert(entity, count)
        };
        self.total = self.total - old.unwrap_or(0) + count;
    }

    fn forget(&mut self, entity: FactId) {
        if let Some(old) = self.per_entity.remove(&entity) {
            self.total -= old;
        }
    }

    fn init_score(&self) -> i64 {
        -(self.total as i64)
    }
}

/// Score director that sequences mutation hooks into shadow propagation
/// and an incrementally maintained tuple network.
///
/// Hooks only record what changed. Listeners run at
/// [`trigger_variable_listeners`](ScoreDirector::trigger_variable_listeners)
/// and the network catches up at
/// [`calculate_score`](ScoreDirector::calculate_score).
///
/// One director serves one thread. Parallel evaluation uses one director
/// per thread, all built from the same [`ScoreDirectorFactory`].
pub struct IncrementalScoreDirector<Sc: Score> {
    factory: Arc<ScoreDirectorFactory<Sc>>,
    working_solution: WorkingSolution<Sc>,
    network: TupleNetwork<Sc>,
    shadow: ShadowEngine,
    pending: PendingChanges,
    /// Facts the network knows about.
    tracked: HashSet<FactId>,
    init: InitTracker,
    hooks: OpenHooks,
    lookup: Option<LookUp>,
    working_entity_list_revision: u64,
    all_changes_will_be_undone: bool,
    calculation_count: u64,
}

impl<Sc: Score> IncrementalScoreDirector<Sc> {
    pub(crate) fn new(
        factory: Arc<ScoreDirectorFactory<Sc>>,
        solution: WorkingSolution<Sc>,
    ) -> Result<Self> {
        let match_enabled = factory.config().score_director.constraint_match_enabled;
        let network = TupleNetwork::new(Arc::clone(factory.network()), match_enabled);
        let shadow = ShadowEngine::new(Arc::clone(factory.shadow_graph()));
        let mut director = Self {
            working_solution: WorkingSolution::new(Arc::clone(factory.schema())),
            factory,
            network,
            shadow,
            pending: PendingChanges::default(),
            tracked: HashSet::new(),
            init: InitTracker::default(),
            hooks: OpenHooks::default(),
            lookup: None,
            working_entity_list_revision: 0,
            all_changes_will_be_undone: false,
            calculation_count: 0,
        };
        director.set_working_solution(solution)?;
        Ok(director)
    }

    /// Replaces the working solution and rebuilds the network from scratch.
    ///
    /// Shadow variables of `solution` are taken as consistent; listeners do
    /// not run until the next change.
    ///
    /// # Errors
    ///
    /// A planning-id violation, or a solution built against another schema.
    pub fn set_working_solution(&mut self, solution: WorkingSolution<Sc>) -> Result<()> {
        let expected = self.factory.schema().fingerprint();
        let actual = solution.schema().fingerprint();
        if expected != actual {
            return Err(ScoreDirectorError::SchemaMismatch { expected, actual });
        }
        let lookup = LookUp::build(solution.store())?;
        let score_director = &self.factory.config().score_director;
        self.lookup = match score_director.look_up_strategy {
            LookUpStrategyType::PlanningId => Some(lookup),
            LookUpStrategyType::None => None,
        };

        let store = solution.store();
        self.network = TupleNetwork::from_store(
            Arc::clone(self.factory.network()),
            store,
            score_director.constraint_match_enabled,
        );
        self.shadow = ShadowEngine::new(Arc::clone(self.factory.shadow_graph()));
        self.shadow.reset(store);
        self.tracked = store.iter().map(|(id, _)| id).collect();
        self.init = InitTracker::default();
        for &fact in &self.tracked {
            self.init.set(fact, solution.uninitialized_variables_of(fact));
        }
        self.pending.clear();
        self.hooks = OpenHooks::default();
        self.working_solution = solution;

        info!(
            event = "working_solution_set",
            facts = self.tracked.len(),
            init_score = self.init.init_score(),
        );
        Ok(())
    }

    pub fn factory(&self) -> &Arc<ScoreDirectorFactory<Sc>> {
        &self.factory
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.factory.environment_mode()
    }

    /// The live network, as of the last settle.
    pub fn network(&self) -> &TupleNetwork<Sc> {
        &self.network
    }

    /// Bumped by every entity addition or removal, unless all changes
    /// are declared to be undone.
    pub fn working_entity_list_revision(&self) -> u64 {
        self.working_entity_list_revision
    }

    /// Declares that every change made from now on is reverted before the
    /// current step ends, so the entity list revision stays put.
    pub fn set_all_changes_will_be_undone(&mut self, all_changes_will_be_undone: bool) {
        self.all_changes_will_be_undone = all_changes_will_be_undone;
    }

    pub fn all_changes_will_be_undone(&self) -> bool {
        self.all_changes_will_be_undone
    }

    /// Number of `calculate_score` calls so far.
    pub fn calculation_count(&self) -> u64 {
        self.calculation_count
    }

    pub fn reset_calculation_count(&mut self) {
        self.calculation_count = 0;
    }

    /// Returns a deep copy of the working solution.
    ///
    /// Under an asserted environment mode the copy is checked to share no
    /// fact record with the original while holding equal facts and score.
    pub fn clone_working_solution(&self) -> Result<WorkingSolution<Sc>> {
        let clone = self.working_solution.clone();
        if self.environment_mode().is_asserted() {
            let original = self.working_solution.store();
            if clone.store().len() != original.len() {
                return Err(ScoreDirectorError::CloneCorruption(format!(
                    "clone holds {} facts, original holds {}",
                    clone.store().len(),
                    original.len()
                )));
            }
            for (id, fact) in original.iter() {
                match clone.store().get(id) {
                    Some(copy) if std::ptr::eq(copy, fact) => {
                        return Err(ScoreDirectorError::CloneCorruption(format!(
                            "fact {} is shared between clone and original",
                            id
                        )));
                    }
                    Some(copy) if copy == fact => {}
                    _ => {
                        return Err(ScoreDirectorError::CloneCorruption(format!(
                            "fact {} differs in the clone",
                            id
                        )));
                    }
                }
            }
            if clone.score() != self.working_solution.score() {
                return Err(ScoreDirectorError::CloneCorruption(
                    "clone score differs from the working score".to_string(),
                ));
            }
        }
        Ok(clone)
    }

    /// Maps an externally held fact to the working fact with the same
    /// planning id.
    ///
    /// # Errors
    ///
    /// [`UsageError::LookUpDisabled`] when the lookup strategy is `None`,
    /// or [`ConfigurationError::MissingPlanningId`] when the fact has no
    /// planning id.
    pub fn look_up_working_object(&self, external: &Fact) -> Result<Option<FactId>> {
        let schema = self.working_solution.schema();
        let key = schema
            .class(external.class())
            .planning_id()
            .and_then(|field| external.fields().get(field))
            .cloned()
            .unwrap_or(Value::None);
        self.look_up_working_fact(external.class(), &key)
    }

    /// The working fact of `class` whose planning id is `id`.
    pub fn look_up_working_fact(&self, class: ClassId, id: &Value) -> Result<Option<FactId>> {
        let lookup = self.lookup.as_ref().ok_or(UsageError::LookUpDisabled)?;
        let schema = self.working_solution.schema();
        if id.is_none() {
            return Err(ConfigurationError::MissingPlanningId {
                class: schema.class(class).name().to_string(),
            }
            .into());
        }
        Ok(lookup.get(schema, class, id)?)
    }

    /// Re-runs every listener on every entity, then settles the cascade.
    pub fn force_trigger_variable_listeners(&mut self) -> Result<()> {
        let touched = self.shadow.force_trigger(self.working_solution.store_mut())?;
        self.mark_updated(touched);
        Ok(())
    }

    /// Constraint match totals as of the last `calculate_score`.
    pub fn constraint_match_totals(&self) -> Result<Vec<ConstraintMatchTotal<Sc>>> {
        if !self.network.inliner().is_constraint_match_enabled() {
            return Err(UsageError::ConstraintMatchDisabled.into());
        }
        Ok(self.network.constraint_match_totals())
    }

    /// Calculates the score and breaks it down per constraint.
    pub fn explain_score(&mut self) -> Result<ScoreExplanation<Sc>> {
        let score = self.calculate_score()?;
        Ok(ScoreExplanation::new(score, self.constraint_match_totals()?))
    }

    /// Calculates the score and attributes every match to the facts it
    /// references.
    pub fn indictments(&mut self) -> Result<IndictmentMap<Sc>> {
        self.calculate_score()?;
        let totals = self.constraint_match_totals()?;
        Ok(IndictmentMap::from_matches(
            totals.iter().flat_map(|total| &total.matches),
        ))
    }

    /// Scores `mv` without keeping it: does the move, calculates the score,
    /// then does the inverse.
    ///
    /// Under [`EnvironmentMode::FullAssert`] the score after the inverse is
    /// checked against the score before the move.
    pub fn evaluate_move(&mut self, mv: &dyn Move<Sc>) -> Result<SolutionScore<Sc>> {
        let hint = std::mem::replace(&mut self.all_changes_will_be_undone, true);
        let result = self.evaluate_move_undone(mv);
        self.all_changes_will_be_undone = hint;
        result
    }

    fn evaluate_move_undone(&mut self, mv: &dyn Move<Sc>) -> Result<SolutionScore<Sc>> {
        let before = if self.environment_mode().is_fully_asserted() {
            Some(self.calculate_score()?)
        } else {
            None
        };
        let undo = mv.do_move(self)?;
        let score = self.calculate_score()?;
        undo.do_move(self)?;

        if let Some(before) = before {
            let restored = self.calculate_score()?;
            if restored != before {
                warn!(
                    event = "undo_move_corruption",
                    before = %before,
                    restored = %restored,
                );
                return Err(ScoreCorruptionError {
                    working: restored.to_string(),
                    scratch: before.to_string(),
                    analysis: format!(
                        "undo move {:?} of move {:?} did not restore the score",
                        undo, mv
                    ),
                    excess: Vec::new(),
                    missing: Vec::new(),
                }
                .into());
            }
        }
        Ok(score)
    }

    /// Compares `working_score` with a recalculation on a fresh network.
    ///
    /// When match tracking is enabled the error lists the matches the
    /// incremental network holds in excess of, or is missing from, the
    /// fresh network.
    pub fn assert_working_score_from_scratch(
        &mut self,
        working_score: SolutionScore<Sc>,
        completed_action: &str,
    ) -> Result<()> {
        self.settle();
        let definition = Arc::clone(self.factory.network());
        let scratch = TupleNetwork::from_store(
            Arc::clone(&definition),
            self.working_solution.store(),
            true,
        );
        let scratch_score = scratch
            .inliner()
            .extract_score(self.working_solution.init_score());
        if working_score == scratch_score {
            return Ok(());
        }

        let mut analysis = vec![format!("after {}", completed_action)];
        if working_score.init_score() != scratch_score.init_score() {
            analysis.push(format!(
                "init score {} should be {}",
                working_score.init_score(),
                scratch_score.init_score()
            ));
        }
        for constraint in definition.constraints() {
            let name = constraint.constraint_ref().full_name();
            let working = self.network.inliner().constraint_score(&name);
            let fresh = scratch.inliner().constraint_score(&name);
            if working != fresh {
                analysis.push(format!(
                    "constraint {} scores {} but should score {}",
                    name,
                    working.unwrap_or_else(Sc::zero),
                    fresh.unwrap_or_else(Sc::zero)
                ));
            }
        }
        let diff = if self.network.inliner().is_constraint_match_enabled() {
            ConstraintMatchDiff::between(
                &self.network.constraint_match_totals(),
                &scratch.constraint_match_totals(),
            )
        } else {
            ConstraintMatchDiff::default()
        };

        error!(
            event = "score_corruption",
            working = %working_score,
            scratch = %scratch_score,
            excess = diff.excess.len(),
            missing = diff.missing.len(),
        );
        Err(ScoreCorruptionError {
            working: working_score.to_string(),
            scratch: scratch_score.to_string(),
            analysis: analysis.join("; "),
            excess: diff.excess,
            missing: diff.missing,
        }
        .into())
    }

    /// Re-runs every listener and fails if any shadow variable changes.
    ///
    /// Pending notifications are drained first, so only values the
    /// listeners should already have written can show up. A stale value
    /// caused by a stale source is not reported when the stale source
    /// itself is. On failure the stale values are left in place.
    pub fn assert_shadow_variables_are_not_stale(&mut self) -> Result<()> {
        self.trigger_variable_listeners()?;
        let snapshot = self.working_solution.store().clone();
        let touched = self.shadow.force_trigger(self.working_solution.store_mut())?;
        if touched.is_empty() {
            return Ok(());
        }

        let graph = Arc::clone(self.shadow.graph());
        let schema = Arc::clone(self.working_solution.schema());
        let targets: Vec<FieldRef> = schema
            .listeners()
            .iter()
            .flat_map(|declaration| declaration.targets().iter().copied())
            .collect();
        let store = self.working_solution.store();
        let mut changed: Vec<(FactId, FieldRef)> = Vec::new();
        for &entity in &touched {
            for &field in targets.iter().filter(|f| f.class() == entity.class()) {
                if snapshot.value(entity, field) != store.value(entity, field) {
                    changed.push((entity, field));
                }
            }
        }
        let changed_set: HashSet<(FactId, FieldRef)> = changed.iter().copied().collect();
        let is_root = |&(entity, field): &(FactId, FieldRef)| {
            graph.owner(field).map_or(true, |order| {
                !graph
                    .sources(order)
                    .iter()
                    .any(|&source| changed_set.contains(&(entity, source)))
            })
        };
        let roots: Vec<(FactId, FieldRef)> = changed.iter().copied().filter(is_root).collect();
        let reported = if roots.is_empty() { &changed } else { &roots };

        let violations: Vec<StaleShadow> = reported
            .iter()
            .map(|&(entity, field)| StaleShadow {
                listener: graph
                    .owner(field)
                    .map(|order| graph.name(order).to_string())
                    .unwrap_or_default(),
                entity,
                variable: schema.field_name(field),
                stale: snapshot.value(entity, field).to_string(),
                fresh: store.value(entity, field).to_string(),
            })
            .collect();

        if violations.is_empty() {
            self.mark_updated(touched);
            return Ok(());
        }
        *self.working_solution.store_mut() = snapshot;
        let error = ShadowVariableStaleError { violations };
        error!(
            event = "shadow_variables_stale",
            listeners = ?error.listeners(),
            count = error.violations.len(),
        );
        Err(error.into())
    }

    /// Pushes every pending fact change into the network.
    fn settle(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let drained = self.pending.drain();
        trace!(
            event = "settle",
            retracts = drained.iter().filter(|(_, c)| *c == PendingChange::Retract).count(),
            updates = drained.iter().filter(|(_, c)| *c == PendingChange::Update).count(),
            inserts = drained.iter().filter(|(_, c)| *c == PendingChange::Insert).count(),
        );
        let solution = &self.working_solution;
        for (fact, change) in drained {
            match change {
                PendingChange::Retract => {
                    self.network.retract(solution.store(), fact);
                    self.init.forget(fact);
                }
                PendingChange::Update => {
                    self.network.update(solution.store(), fact);
                    self.init.set(fact, solution.uninitialized_variables_of(fact));
                }
                PendingChange::Insert => {
                    self.network.insert(solution.store(), fact);
                    self.init.set(fact, solution.uninitialized_variables_of(fact));
                }
            }
        }
    }

    fn mark_updated(&mut self, touched: Vec<FactId>) {
        for entity in touched {
            if self.tracked.contains(&entity) {
                self.pending.update(entity);
            }
        }
    }

    fn schema(&self) -> Arc<SolutionSchema> {
        Arc::clone(self.working_solution.schema())
    }

    fn expect_tracked(&self, fact: FactId) -> Result<()> {
        if self.tracked.contains(&fact) {
            Ok(())
        } else {
            Err(UsageError::FactNotInserted { fact }.into())
        }
    }

    fn expect_kind(&self, fact: FactId, expected: ClassKind) -> Result<()> {
        let actual = self.working_solution.schema().class(fact.class()).kind();
        if actual == expected {
            Ok(())
        } else {
            Err(UsageError::WrongFactKind {
                fact,
                expected: expected.label(),
                actual: actual.label(),
            }
            .into())
        }
    }

    /// Registers a fact that just entered the store.
    fn track(&mut self, fact: FactId) -> Result<()> {
        let schema = self.schema();
        let Some(record) = self.working_solution.store().get(fact) else {
            return Err(UsageError::UnknownFact { fact }.into());
        };
        if self.tracked.contains(&fact) {
            return Err(UsageError::FactAlreadyInserted { fact }.into());
        }
        if let Some(lookup) = &mut self.lookup {
            lookup.add(&schema, fact, record)?;
        }
        self.tracked.insert(fact);
        self.pending.insert(fact);
        Ok(())
    }

    /// Forgets a fact that is about to leave the store.
    fn untrack(&mut self, fact: FactId) {
        let schema = self.schema();
        if let (Some(lookup), Some(record)) =
            (&mut self.lookup, self.working_solution.store().get(fact))
        {
            lookup.remove(&schema, fact, record);
        }
        self.pending.retract(fact);
    }

    fn expect_gone(&mut self, fact: FactId) -> Result<()> {
        if self.working_solution.store().contains(fact) {
            return Err(UsageError::FactStillPresent { fact }.into());
        }
        self.tracked.remove(&fact);
        Ok(())
    }

    fn bump_revision(&mut self) {
        if !self.all_changes_will_be_undone {
            self.working_entity_list_revision += 1;
        }
    }
}

impl<Sc: Score> ScoreDirector<Sc> for IncrementalScoreDirector<Sc> {
    fn working_solution(&self) -> &WorkingSolution<Sc> {
        &self.working_solution
    }

    fn working_solution_mut(&mut self) -> &mut WorkingSolution<Sc> {
        &mut self.working_solution
    }

    fn before_entity_added(&mut self, class: ClassId) -> Result<()> {
        self.hooks.adding_entities.push(class);
        Ok(())
    }

    fn after_entity_added(&mut self, entity: FactId) -> Result<()> {
        if !close_class(&mut self.hooks.adding_entities, entity.class()) {
            return Err(UsageError::UnpairedHook {
                hook: "after_entity_added",
                fact: entity,
            }
            .into());
        }
        self.expect_kind(entity, ClassKind::Entity)?;
        self.track(entity)?;
        self.shadow.after_entity_added(entity);
        self.bump_revision();
        Ok(())
    }

    fn before_variable_changed(&mut self, entity: FactId, variable: FieldRef) -> Result<()> {
        self.expect_tracked(entity)?;
        let schema = self.schema();
        if variable.class() != entity.class() {
            return Err(UsageError::ClassMismatch {
                fact: entity,
                variable: schema.field_name(variable),
            }
            .into());
        }
        match schema.field(variable).kind {
            FieldKind::Genuine { .. } => {}
            FieldKind::Shadow => {
                return Err(UsageError::ShadowMutationOutsideListener {
                    variable: schema.field_name(variable),
                }
                .into());
            }
            FieldKind::Plain => {
                return Err(UsageError::NotAVariable {
                    variable: schema.field_name(variable),
                }
                .into());
            }
        }
        self.shadow
            .before_variable_changed(self.working_solution.store(), entity, variable);
        open(&mut self.hooks.changing, (entity, variable));
        Ok(())
    }

    fn after_variable_changed(&mut self, entity: FactId, variable: FieldRef) -> Result<()> {
        if !close(&mut self.hooks.changing, (entity, variable)) {
            return Err(UsageError::UnpairedHook {
                hook: "after_variable_changed",
                fact: entity,
            }
            .into());
        }
        self.pending.update(entity);
        Ok(())
    }

    fn before_entity_removed(&mut self, entity: FactId) -> Result<()> {
        self.expect_tracked(entity)?;
        self.expect_kind(entity, ClassKind::Entity)?;
        if self.hooks.removing_entities.contains(&entity) {
            return Err(UsageError::UnpairedHook {
                hook: "before_entity_removed",
                fact: entity,
            }
            .into());
        }
        self.shadow
            .before_entity_removed(self.working_solution.store(), entity);
        self.untrack(entity);
        self.hooks.removing_entities.insert(entity);
        Ok(())
    }

    fn after_entity_removed(&mut self, entity: FactId) -> Result<()> {
        if !self.hooks.removing_entities.remove(&entity) {
            return Err(UsageError::UnpairedHook {
                hook: "after_entity_removed",
                fact: entity,
            }
            .into());
        }
        self.expect_gone(entity)?;
        self.bump_revision();
        Ok(())
    }

    fn before_problem_fact_added(&mut self, class: ClassId) -> Result<()> {
        self.hooks.adding_facts.push(class);
        Ok(())
    }

    fn after_problem_fact_added(&mut self, fact: FactId) -> Result<()> {
        if !close_class(&mut self.hooks.adding_facts, fact.class()) {
            return Err(UsageError::UnpairedHook {
                hook: "after_problem_fact_added",
                fact,
            }
            .into());
        }
        self.expect_kind(fact, ClassKind::ProblemFact)?;
        self.track(fact)
    }

    fn before_problem_property_changed(&mut self, fact: FactId) -> Result<()> {
        self.expect_tracked(fact)?;
        let schema = self.schema();
        if let (Some(lookup), Some(record)) =
            (&mut self.lookup, self.working_solution.store().get(fact))
        {
            lookup.remove(&schema, fact, record);
        }
        open(&mut self.hooks.changing_facts, fact);
        Ok(())
    }

    fn after_problem_property_changed(&mut self, fact: FactId) -> Result<()> {
        if !close(&mut self.hooks.changing_facts, fact) {
            return Err(UsageError::UnpairedHook {
                hook: "after_problem_property_changed",
                fact,
            }
            .into());
        }
        let schema = self.schema();
        if let (Some(lookup), Some(record)) =
            (&mut self.lookup, self.working_solution.store().get(fact))
        {
            lookup.add(&schema, fact, record)?;
        }
        self.pending.update(fact);
        Ok(())
    }

    fn before_problem_fact_removed(&mut self, fact: FactId) -> Result<()> {
        self.expect_tracked(fact)?;
        self.expect_kind(fact, ClassKind::ProblemFact)?;
        if self.hooks.removing_facts.contains(&fact) {
            return Err(UsageError::UnpairedHook {
                hook: "before_problem_fact_removed",
                fact,
            }
            .into());
        }
        self.untrack(fact);
        self.hooks.removing_facts.insert(fact);
        Ok(())
    }

    fn after_problem_fact_removed(&mut self, fact: FactId) -> Result<()> {
        if !self.hooks.removing_facts.remove(&fact) {
            return Err(UsageError::UnpairedHook {
                hook: "after_problem_fact_removed",
                fact,
            }
            .into());
        }
        self.expect_gone(fact)
    }

    fn trigger_variable_listeners(&mut self) -> Result<()> {
        let touched = self.shadow.trigger(self.working_solution.store_mut())?;
        self.mark_updated(touched);
        Ok(())
    }

    fn calculate_score(&mut self) -> Result<SolutionScore<Sc>> {
        self.trigger_variable_listeners()?;
        let mode = self.environment_mode();
        if mode.is_fully_asserted() {
            self.assert_shadow_variables_are_not_stale()?;
        }
        self.settle();
        let score = self.network.inliner().extract_score(self.init.init_score());
        self.working_solution.set_score(Some(score));
        self.calculation_count += 1;
        if mode.is_asserted() {
            self.assert_working_score_from_scratch(score, "calculate_score")?;
        }
        Ok(score)
    }
}
