//! Shadow variable fixtures.
//!
//! - [`ShadowChain`]: `x` (genuine) feeds `first`, `first` feeds `second`,
//!   `second` feeds `third`; each listener appends its suffix.
//! - [`Diamond`]: `a` feeds `b` and `c`, which both feed `d`.
//! - [`cyclic_schema`]: two listeners reading each other's targets.
//!
//! Every listener appends its name to a shared [`FireLog`] when it runs.
//!
//! # Example
//!
//! ```
//! use scoreforge_test::ShadowChain;
//!
//! let chain = ShadowChain::new();
//! assert_eq!(chain.schema.listeners().len(), 3);
//! assert!(chain.log.is_empty());
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use scoreforge_core::domain::{
    ClassDef, ClassId, Fact, FieldRef, ListenerDeclaration, ShadowWriter, SolutionSchema,
    VariableListener, WorkingSolution,
};
use scoreforge_core::{FactId, ListenerError, Score, Value};

/// Names of listeners in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct FireLog(Arc<Mutex<Vec<String>>>);

impl FireLog {
    pub fn record(&self, name: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.entries().iter().filter(|n| *n == name).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Writes `target = join(sources) + suffix`, or `None` while any source is `None`.
struct AppendListener {
    name: &'static str,
    sources: Vec<FieldRef>,
    target: FieldRef,
    suffix: &'static str,
    log: FireLog,
    /// When set, variable changes are ignored; only entity additions update.
    broken: bool,
}

impl AppendListener {
    fn compute(&self, writer: &dyn ShadowWriter, entity: FactId) -> Value {
        let mut parts = Vec::with_capacity(self.sources.len());
        for &source in &self.sources {
            match writer.value(entity, source).as_text() {
                Some(text) => parts.push(text.to_string()),
                None => return Value::None,
            }
        }
        Value::text(format!("{}{}", parts.join("+"), self.suffix))
    }

    fn update(&mut self, writer: &mut dyn ShadowWriter, entity: FactId) -> Result<(), ListenerError> {
        self.log.record(self.name);
        let value = self.compute(writer, entity);
        writer.set_shadow(entity, self.target, value)?;
        Ok(())
    }
}

impl VariableListener for AppendListener {
    fn after_variable_changed(
        &mut self,
        writer: &mut dyn ShadowWriter,
        entity: FactId,
    ) -> Result<(), ListenerError> {
        if self.broken {
            self.log.record(self.name);
            return Ok(());
        }
        self.update(writer, entity)
    }

    fn after_entity_added(
        &mut self,
        writer: &mut dyn ShadowWriter,
        entity: FactId,
    ) -> Result<(), ListenerError> {
        self.update(writer, entity)
    }
}

fn append_listener(
    name: &'static str,
    sources: &[FieldRef],
    target: FieldRef,
    suffix: &'static str,
    log: &FireLog,
    broken: bool,
) -> ListenerDeclaration {
    let log = log.clone();
    let listener_sources = sources.to_vec();
    let mut declaration = ListenerDeclaration::new(name, move || {
        Box::new(AppendListener {
            name,
            sources: listener_sources.clone(),
            target,
            suffix,
            log: log.clone(),
            broken,
        })
    });
    for &source in sources {
        declaration = declaration.source(source);
    }
    declaration.target(target)
}

/// Three-deep shadow chain on class `Chained`.
#[derive(Debug, Clone)]
pub struct ShadowChain {
    pub schema: Arc<SolutionSchema>,
    pub class: ClassId,
    pub id: FieldRef,
    pub x: FieldRef,
    pub first: FieldRef,
    pub second: FieldRef,
    pub third: FieldRef,
    pub log: FireLog,
}

impl ShadowChain {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// A chain whose `FirstShadowListener` ignores variable changes.
    pub fn broken() -> Self {
        Self::build(true)
    }

    fn build(broken: bool) -> Self {
        let log = FireLog::default();
        let mut builder = SolutionSchema::builder();
        let class = builder
            .class(
                ClassDef::entity("Chained")
                    .with_planning_id("id")
                    .with_genuine("x")
                    .with_shadow("first")
                    .with_shadow("second")
                    .with_shadow("third"),
            )
            .expect("valid chained class");
        let field = |b: &scoreforge_core::SchemaBuilder, name: &str| {
            b.field_ref("Chained", name).expect("field")
        };
        let (id, x, first, second, third) = (
            field(&builder, "id"),
            field(&builder, "x"),
            field(&builder, "first"),
            field(&builder, "second"),
            field(&builder, "third"),
        );
        builder
            .listener(append_listener("FirstShadowListener", &[x], first, "/firstShadow", &log, broken))
            .listener(append_listener("SecondShadowListener", &[first], second, "/secondShadow", &log, false))
            .listener(append_listener("ThirdShadowListener", &[second], third, "/thirdShadow", &log, false));
        let schema = builder.build().expect("valid schema");
        Self {
            schema,
            class,
            id,
            x,
            first,
            second,
            third,
            log,
        }
    }

    pub fn empty<Sc: Score>(&self) -> WorkingSolution<Sc> {
        WorkingSolution::new(Arc::clone(&self.schema))
    }

    /// An entity with `x` unassigned and no shadow values.
    pub fn entity(&self, id: i64) -> Fact {
        Fact::new(&self.schema, self.class).with(self.id, id)
    }
}

impl Default for ShadowChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Diamond dependency on class `Node`: `a -> b`, `a -> c`, `{b, c} -> d`.
#[derive(Debug, Clone)]
pub struct Diamond {
    pub schema: Arc<SolutionSchema>,
    pub class: ClassId,
    pub a: FieldRef,
    pub b: FieldRef,
    pub c: FieldRef,
    pub d: FieldRef,
    pub log: FireLog,
}

impl Diamond {
    pub fn new() -> Self {
        let log = FireLog::default();
        let mut builder = SolutionSchema::builder();
        let class = builder
            .class(
                ClassDef::entity("Node")
                    .with_genuine("a")
                    .with_shadow("d")
                    .with_shadow("b")
                    .with_shadow("c"),
            )
            .expect("valid node class");
        let field = |b: &scoreforge_core::SchemaBuilder, name: &str| {
            b.field_ref("Node", name).expect("field")
        };
        let (a, b, c, d) = (
            field(&builder, "a"),
            field(&builder, "b"),
            field(&builder, "c"),
            field(&builder, "d"),
        );
        // Declared out of dependency order; the shadow graph must sort them.
        builder
            .listener(append_listener("DListener", &[b, c], d, "/d", &log, false))
            .listener(append_listener("BListener", &[a], b, "/b", &log, false))
            .listener(append_listener("CListener", &[a], c, "/c", &log, false));
        let schema = builder.build().expect("valid schema");
        Self {
            schema,
            class,
            a,
            b,
            c,
            d,
            log,
        }
    }

    pub fn empty<Sc: Score>(&self) -> WorkingSolution<Sc> {
        WorkingSolution::new(Arc::clone(&self.schema))
    }

    pub fn node(&self) -> Fact {
        Fact::new(&self.schema, self.class)
    }
}

impl Default for Diamond {
    fn default() -> Self {
        Self::new()
    }
}

/// Listeners `Ping` (`pong -> ping`) and `Pong` (`ping -> pong`) depend on
/// each other; the schema is valid but its shadow graph is cyclic.
pub fn cyclic_schema() -> Arc<SolutionSchema> {
    let log = FireLog::default();
    let mut builder = SolutionSchema::builder();
    builder
        .class(
            ClassDef::entity("Loop")
                .with_genuine("seed")
                .with_shadow("ping")
                .with_shadow("pong"),
        )
        .expect("valid loop class");
    let ping = builder.field_ref("Loop", "ping").expect("field");
    let pong = builder.field_ref("Loop", "pong").expect("field");
    builder
        .listener(append_listener("Ping", &[pong], ping, "/ping", &log, false))
        .listener(append_listener("Pong", &[ping], pong, "/pong", &log, false));
    builder.build().expect("valid schema")
}
