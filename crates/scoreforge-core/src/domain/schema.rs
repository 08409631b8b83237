//! Runtime schema describing fact classes, their fields and shadow listeners.
//!
//! A schema is assembled once with [`SchemaBuilder`] and then shared read-only
//! (`Arc<SolutionSchema>`) by every working solution and score director built
//! against it. Field names are resolved to [`FieldRef`] accessors at build time
//! so the hot path only ever indexes by position.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::ConfigurationError;

use super::listener::ListenerDeclaration;

/// Index of a class within its [`SolutionSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a class holds planning entities or immutable problem facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Entity,
    ProblemFact,
}

impl ClassKind {
    pub fn label(self) -> &'static str {
        match self {
            ClassKind::Entity => "planning entity",
            ClassKind::ProblemFact => "problem fact",
        }
    }
}

/// What a field is and who may write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Plain property, changed only through problem-fact hooks.
    Plain,
    /// Genuine planning variable assigned by moves.
    ///
    /// Unless `allows_unassigned` is set, [`Value::None`](super::Value::None)
    /// counts against the initialization score.
    Genuine { allows_unassigned: bool },
    /// Shadow variable written exclusively by its variable listener.
    Shadow,
}

/// Accessor capability for one field of one class.
///
/// Resolved once by name through [`SolutionSchema::field_ref`]; reads and
/// writes are then plain index operations on a [`Fact`](super::Fact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    class: ClassId,
    index: u32,
}

impl FieldRef {
    /// The class that owns this field.
    #[inline]
    pub fn class(self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: Arc<str>,
    pub kind: FieldKind,
}

/// Declaration of one fact class.
///
/// # Example
///
/// ```
/// use scoreforge_core::domain::ClassDef;
///
/// let queen = ClassDef::entity("Queen")
///     .with_planning_id("id")
///     .with_field("column")
///     .with_genuine("row");
/// assert_eq!(queen.fields().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ClassDef {
    name: Arc<str>,
    kind: ClassKind,
    fields: Vec<FieldDef>,
    planning_id: Option<usize>,
}

impl ClassDef {
    pub fn entity(name: &str) -> Self {
        Self::new(name, ClassKind::Entity)
    }

    pub fn problem_fact(name: &str) -> Self {
        Self::new(name, ClassKind::ProblemFact)
    }

    fn new(name: &str, kind: ClassKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            fields: Vec::new(),
            planning_id: None,
        }
    }

    /// Adds a plain field that also serves as the planning id.
    pub fn with_planning_id(mut self, name: &str) -> Self {
        self.planning_id = Some(self.fields.len());
        self.push(name, FieldKind::Plain)
    }

    pub fn with_field(self, name: &str) -> Self {
        self.push(name, FieldKind::Plain)
    }

    pub fn with_genuine(self, name: &str) -> Self {
        self.push(
            name,
            FieldKind::Genuine {
                allows_unassigned: false,
            },
        )
    }

    /// Adds a genuine variable for which `None` is a legal final value.
    pub fn with_unassignable(self, name: &str) -> Self {
        self.push(
            name,
            FieldKind::Genuine {
                allows_unassigned: true,
            },
        )
    }

    pub fn with_shadow(self, name: &str) -> Self {
        self.push(name, FieldKind::Shadow)
    }

    fn push(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDef {
            name: Arc::from(name),
            kind,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Position of the planning-id field, if the class declares one.
    pub fn planning_id(&self) -> Option<usize> {
        self.planning_id
    }

    /// Positions of genuine variables that count against the init score.
    pub fn required_genuine_fields(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields.iter().enumerate().filter_map(|(i, f)| {
            matches!(
                f.kind,
                FieldKind::Genuine {
                    allows_unassigned: false
                }
            )
            .then_some(i)
        })
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| &*f.name == field)
    }
}

/// Structural hash of a schema's class, field and listener declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaFingerprint(u64);

impl SchemaFingerprint {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The immutable description of every fact class in a planning problem.
pub struct SolutionSchema {
    classes: Vec<ClassDef>,
    class_index: HashMap<Arc<str>, ClassId>,
    listeners: Vec<ListenerDeclaration>,
    fingerprint: SchemaFingerprint,
}

impl SolutionSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// # Panics
    /// Panics if `id` was not issued by this schema.
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    pub fn class_id(&self, name: &str) -> Result<ClassId, ConfigurationError> {
        self.class_index
            .get(name)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownClass {
                class: name.to_string(),
            })
    }

    /// Resolves a field accessor by class and field name.
    pub fn field_ref(&self, class: &str, field: &str) -> Result<FieldRef, ConfigurationError> {
        let id = self.class_id(class)?;
        let index = self.classes[id.index()].position(field).ok_or_else(|| {
            ConfigurationError::UnknownField {
                class: class.to_string(),
                field: field.to_string(),
            }
        })?;
        Ok(FieldRef {
            class: id,
            index: index as u32,
        })
    }

    pub fn field(&self, field: FieldRef) -> &FieldDef {
        &self.classes[field.class.index()].fields[field.index()]
    }

    /// Renders a field as `Class.field`.
    pub fn field_name(&self, field: FieldRef) -> String {
        let class = &self.classes[field.class.index()];
        format!("{}.{}", class.name, class.fields[field.index()].name)
    }

    pub fn listeners(&self) -> &[ListenerDeclaration] {
        &self.listeners
    }

    pub fn fingerprint(&self) -> SchemaFingerprint {
        self.fingerprint
    }
}

impl fmt::Debug for SolutionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionSchema")
            .field("classes", &self.classes)
            .field("listeners", &self.listeners.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Incrementally assembles a [`SolutionSchema`].
///
/// # Example
///
/// ```
/// use scoreforge_core::domain::{ClassDef, SolutionSchema};
///
/// let mut builder = SolutionSchema::builder();
/// let queen = builder
///     .class(ClassDef::entity("Queen").with_planning_id("id").with_genuine("row"))
///     .unwrap();
/// let schema = builder.build().unwrap();
///
/// assert_eq!(schema.class_id("Queen").unwrap(), queen);
/// assert!(schema.field_ref("Queen", "row").is_ok());
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    classes: Vec<ClassDef>,
    class_index: HashMap<Arc<str>, ClassId>,
    listeners: Vec<ListenerDeclaration>,
}

impl SchemaBuilder {
    /// Registers a class and returns its id.
    pub fn class(&mut self, class: ClassDef) -> Result<ClassId, ConfigurationError> {
        if self.class_index.contains_key(&class.name) {
            return Err(ConfigurationError::DuplicateClass {
                class: class.name.to_string(),
            });
        }
        for (i, field) in class.fields.iter().enumerate() {
            if class.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ConfigurationError::DuplicateField {
                    class: class.name.to_string(),
                    field: field.name.to_string(),
                });
            }
        }
        let id = ClassId(self.classes.len() as u32);
        self.class_index.insert(Arc::clone(&class.name), id);
        self.classes.push(class);
        Ok(id)
    }

    /// Resolves a field of an already registered class.
    pub fn field_ref(&self, class: &str, field: &str) -> Result<FieldRef, ConfigurationError> {
        let id = *self
            .class_index
            .get(class)
            .ok_or_else(|| ConfigurationError::UnknownClass {
                class: class.to_string(),
            })?;
        let index = self.classes[id.index()].position(field).ok_or_else(|| {
            ConfigurationError::UnknownField {
                class: class.to_string(),
                field: field.to_string(),
            }
        })?;
        Ok(FieldRef {
            class: id,
            index: index as u32,
        })
    }

    pub fn listener(&mut self, declaration: ListenerDeclaration) -> &mut Self {
        self.listeners.push(declaration);
        self
    }

    /// Validates listener declarations and freezes the schema.
    ///
    /// Every listener source must be a genuine or shadow variable, every
    /// target must be a shadow variable, and every shadow variable must be
    /// written by exactly one listener. Cycles between listeners are
    /// rejected later, when the shadow graph is compiled.
    pub fn build(self) -> Result<Arc<SolutionSchema>, ConfigurationError> {
        let describe = |field: FieldRef| {
            let class = &self.classes[field.class.index()];
            (
                class.name.to_string(),
                class.fields[field.index()].name.to_string(),
            )
        };

        let mut owners: HashMap<FieldRef, &str> = HashMap::new();
        for declaration in &self.listeners {
            for &source in declaration.sources() {
                let kind = self.classes[source.class.index()].fields[source.index()].kind;
                if kind == FieldKind::Plain {
                    let (class, field) = describe(source);
                    return Err(ConfigurationError::NotAVariable { class, field });
                }
            }
            for &target in declaration.targets() {
                let kind = self.classes[target.class.index()].fields[target.index()].kind;
                if kind != FieldKind::Shadow {
                    let (class, field) = describe(target);
                    return Err(ConfigurationError::NotAShadowVariable { class, field });
                }
                if let Some(first) = owners.insert(target, declaration.name()) {
                    let (class, field) = describe(target);
                    return Err(ConfigurationError::ShadowVariableOwnedTwice {
                        class,
                        field,
                        first: first.to_string(),
                        second: declaration.name().to_string(),
                    });
                }
            }
        }

        for (c, class) in self.classes.iter().enumerate() {
            for (i, field) in class.fields.iter().enumerate() {
                let field_ref = FieldRef {
                    class: ClassId(c as u32),
                    index: i as u32,
                };
                if field.kind == FieldKind::Shadow && !owners.contains_key(&field_ref) {
                    return Err(ConfigurationError::UnownedShadowVariable {
                        class: class.name.to_string(),
                        field: field.name.to_string(),
                    });
                }
            }
        }

        let listeners = self.listeners;
        let fingerprint = fingerprint(&self.classes, &listeners);

        Ok(Arc::new(SolutionSchema {
            classes: self.classes,
            class_index: self.class_index,
            listeners,
            fingerprint,
        }))
    }
}

fn fingerprint(classes: &[ClassDef], listeners: &[ListenerDeclaration]) -> SchemaFingerprint {
    let mut hasher = DefaultHasher::new();
    for class in classes {
        class.name.hash(&mut hasher);
        class.kind.hash(&mut hasher);
        class.planning_id.hash(&mut hasher);
        class.fields.len().hash(&mut hasher);
        for field in &class.fields {
            field.name.hash(&mut hasher);
            field.kind.hash(&mut hasher);
        }
    }
    for listener in listeners {
        listener.name().hash(&mut hasher);
        listener.sources().hash(&mut hasher);
        listener.targets().hash(&mut hasher);
    }
    SchemaFingerprint(hasher.finish())
}
