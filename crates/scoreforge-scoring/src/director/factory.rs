//! Score director factory for creating score directors.

use std::sync::Arc;

use scoreforge_config::{EngineConfig, EnvironmentMode};
use scoreforge_core::domain::{SolutionSchema, WorkingSolution};
use scoreforge_core::{ParseableScore, Score};

use super::incremental::IncrementalScoreDirector;
use crate::api::weight_overrides::ConstraintWeightOverrides;
use crate::error::{Result, ScoreDirectorError};
use crate::network::NetworkDefinition;
use crate::shadow::ShadowGraph;

/// Immutable state shared by every director of one problem schema.
///
/// The network definition and the compiled shadow graph are built once and
/// shared read-only; each director built from the factory owns its own
/// network memories, listener instances and working solution, so directors
/// may run on different threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use scoreforge_config::EngineConfig;
/// use scoreforge_core::SimpleScore;
/// use scoreforge_scoring::director::{ScoreDirector, ScoreDirectorFactory};
/// use scoreforge_scoring::stream::joiner::equal;
/// use scoreforge_scoring::stream::{ConstraintFactory, Mapping};
/// use scoreforge_test::Assignment;
///
/// let fixture = Assignment::new();
/// let value = fixture.value;
/// let network = ConstraintFactory::define(fixture.schema.clone(), |factory| {
///     factory
///         .for_each_unique_pair("Entity", [equal(Mapping::field(0, value))])
///         .penalize(SimpleScore::ONE)
///         .as_constraint("Conflict");
/// })
/// .unwrap();
/// let factory = Arc::new(ScoreDirectorFactory::new(network, EngineConfig::default()).unwrap());
///
/// let (solution, _) = fixture.solution::<SimpleScore>(&["v1"], &[Some(0), Some(0)]);
/// let mut director = factory.build_score_director(solution).unwrap();
/// assert_eq!(director.calculate_score().unwrap().score(), SimpleScore::of(-1));
/// ```
#[derive(Debug)]
pub struct ScoreDirectorFactory<Sc: Score> {
    network: Arc<NetworkDefinition<Sc>>,
    shadow_graph: Arc<ShadowGraph>,
    config: EngineConfig,
}

impl<Sc: ParseableScore> ScoreDirectorFactory<Sc> {
    /// Compiles the shadow graph and applies the configured weight overrides.
    ///
    /// # Errors
    ///
    /// A cyclic listener graph, or a configured weight that does not parse
    /// as `Sc`.
    pub fn new(network: NetworkDefinition<Sc>, config: EngineConfig) -> Result<Self> {
        let shadow_graph = ShadowGraph::compile(network.schema())?;
        let overrides =
            ConstraintWeightOverrides::from_pairs(config.score_director.parsed_constraint_weights::<Sc>()?);
        let network = if overrides.is_empty() {
            network
        } else {
            network.with_weight_overrides(&overrides)
        };
        Ok(Self {
            network: Arc::new(network),
            shadow_graph: Arc::new(shadow_graph),
            config,
        })
    }
}

impl<Sc: Score> ScoreDirectorFactory<Sc> {
    /// Replaces the weights of the named constraints.
    pub fn with_weight_overrides(mut self, overrides: &ConstraintWeightOverrides<Sc>) -> Self {
        self.network = Arc::new(self.network.with_weight_overrides(overrides));
        self
    }

    /// Creates a director over `solution`.
    ///
    /// # Errors
    ///
    /// [`ScoreDirectorError::SchemaMismatch`] if the solution was built
    /// against another schema, or a planning-id violation.
    pub fn build_score_director(
        self: &Arc<Self>,
        solution: WorkingSolution<Sc>,
    ) -> Result<IncrementalScoreDirector<Sc>> {
        let expected = self.network.schema().fingerprint();
        let actual = solution.schema().fingerprint();
        if expected != actual {
            return Err(ScoreDirectorError::SchemaMismatch { expected, actual });
        }
        IncrementalScoreDirector::new(Arc::clone(self), solution)
    }

    pub fn network(&self) -> &Arc<NetworkDefinition<Sc>> {
        &self.network
    }

    pub fn shadow_graph(&self) -> &Arc<ShadowGraph> {
        &self.shadow_graph
    }

    pub fn schema(&self) -> &Arc<SolutionSchema> {
        self.network.schema()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.config.environment_mode
    }
}
