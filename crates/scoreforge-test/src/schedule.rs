//! Shifts assigned to employees.
//!
//! `Employee` and `Unavailable` are problem facts; `Shift` is a planning
//! entity with plain `start`/`end` times and a genuine `employee` variable.
//! `Unavailable` marks a point in time at which an employee cannot work.
//!
//! # Example
//!
//! ```
//! use scoreforge_core::SimpleScore;
//! use scoreforge_test::Schedule;
//!
//! let fixture = Schedule::new();
//! let mut solution = fixture.empty::<SimpleScore>();
//! let ann = solution.insert(fixture.employee("Ann"));
//! solution.insert(fixture.shift(1, 0, 8, Some(ann)));
//! assert_eq!(solution.store().len(), 2);
//! ```

use std::sync::Arc;

use scoreforge_core::domain::{ClassDef, ClassId, Fact, FactId, FieldRef, SolutionSchema, WorkingSolution};
use scoreforge_core::Score;

/// Schema and accessors for the schedule fixture.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub schema: Arc<SolutionSchema>,
    pub employee: ClassId,
    pub shift: ClassId,
    pub unavailable: ClassId,
    pub employee_name: FieldRef,
    pub shift_id: FieldRef,
    pub start: FieldRef,
    pub end: FieldRef,
    /// Genuine variable of `Shift`; unassigned shifts are allowed.
    pub assignee: FieldRef,
    pub unavailable_employee: FieldRef,
    pub unavailable_time: FieldRef,
}

impl Schedule {
    pub fn new() -> Self {
        let mut builder = SolutionSchema::builder();
        let employee = builder
            .class(ClassDef::problem_fact("Employee").with_planning_id("name"))
            .expect("valid employee class");
        let shift = builder
            .class(
                ClassDef::entity("Shift")
                    .with_planning_id("id")
                    .with_field("start")
                    .with_field("end")
                    .with_unassignable("employee"),
            )
            .expect("valid shift class");
        let unavailable = builder
            .class(
                ClassDef::problem_fact("Unavailable")
                    .with_field("employee")
                    .with_field("time"),
            )
            .expect("valid unavailable class");
        let schema = builder.build().expect("valid schema");
        let field = |class: &str, name: &str| schema.field_ref(class, name).expect("field");
        Self {
            employee_name: field("Employee", "name"),
            shift_id: field("Shift", "id"),
            start: field("Shift", "start"),
            end: field("Shift", "end"),
            assignee: field("Shift", "employee"),
            unavailable_employee: field("Unavailable", "employee"),
            unavailable_time: field("Unavailable", "time"),
            employee,
            shift,
            unavailable,
            schema,
        }
    }

    pub fn empty<Sc: Score>(&self) -> WorkingSolution<Sc> {
        WorkingSolution::new(Arc::clone(&self.schema))
    }

    pub fn employee(&self, name: &str) -> Fact {
        Fact::new(&self.schema, self.employee).with(self.employee_name, name)
    }

    pub fn shift(&self, id: i64, start: i64, end: i64, employee: Option<FactId>) -> Fact {
        Fact::new(&self.schema, self.shift)
            .with(self.shift_id, id)
            .with(self.start, start)
            .with(self.end, end)
            .with(self.assignee, employee)
    }

    pub fn unavailable(&self, employee: FactId, time: i64) -> Fact {
        Fact::new(&self.schema, self.unavailable)
            .with(self.unavailable_employee, employee)
            .with(self.unavailable_time, time)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}
