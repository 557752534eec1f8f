//! Explicit unit contexts: a registry plus its systems, and named groups of
//! contexts with one active.

use std::collections::HashMap;
use std::path::Path;

use crate::display::Rendered;
use crate::quantity::Quantity;
use crate::registry::{Registry, Unit, UnitDefinition};
use crate::system::{RoleTable, Systems, SystemsDefinition};
use crate::types::{DefinitionError, Magnitude, Result, Spec, UnitError, UnitId};

/// Name used for the group created on demand by [`Groups::active_or_builtin`].
pub const DEFAULT_GROUP: &str = "default";

/// A registry with its unit systems and role pins.
///
/// Quantities carry no reference back to the context that made them; pass
/// the context to whatever renders them.
#[derive(Debug, Clone)]
pub struct UnitContext {
    registry: Registry,
    systems: Systems,
}

impl UnitContext {
    /// Create a context from an existing registry and systems
    pub fn new(registry: Registry, systems: Systems) -> Self {
        Self { registry, systems }
    }

    /// Build a context from parsed unit and system definitions
    pub fn from_definitions(units: &UnitDefinition, systems: &SystemsDefinition) -> Result<Self> {
        let mut registry = Registry::from_definition(units)?;
        let systems = Systems::from_definition(&mut registry, systems)?;
        Ok(Self::new(registry, systems))
    }

    /// Build a context from JSON unit and system documents
    pub fn from_json(units: &str, systems: &str) -> std::result::Result<Self, DefinitionError> {
        let units = UnitDefinition::from_json_str(units)?;
        let systems = SystemsDefinition::from_json_str(systems)?;
        Ok(Self::from_definitions(&units, &systems)?)
    }

    /// Build a context from TOML unit and system documents
    pub fn from_toml(units: &str, systems: &str) -> std::result::Result<Self, DefinitionError> {
        let units = UnitDefinition::from_toml_str(units)?;
        let systems = SystemsDefinition::from_toml_str(systems)?;
        Ok(Self::from_definitions(&units, &systems)?)
    }

    /// Bundled SI and US customary units with the `metric` and `US` systems.
    pub fn builtin() -> std::result::Result<Self, DefinitionError> {
        let mut registry = Registry::builtin()?;
        let systems = Systems::builtin(&mut registry)?;
        Ok(Self::new(registry, systems))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn systems(&self) -> &Systems {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut Systems {
        &mut self.systems
    }

    /// Resolve a unit name or expression, registering compound units on first use.
    pub fn unit(&mut self, token: &str) -> Result<Unit> {
        self.registry.lookup(token)
    }

    /// `value` expressed in `unit`.
    pub fn quantify(&mut self, value: impl Into<Magnitude>, unit: &str) -> Result<Quantity> {
        let unit = self.registry.lookup(unit)?;
        Ok(Quantity::quantify(value, &unit))
    }

    /// Switch the active unit system
    pub fn set_system(&mut self, name: &str) -> Result<()> {
        self.systems.set_active(name)
    }

    /// Name of the active unit system
    pub fn active_system(&self) -> Option<&str> {
        self.systems.active_name()
    }

    /// Install a role table
    pub fn set_roles(&mut self, table: &RoleTable) -> Result<()> {
        self.systems.set_roles(&mut self.registry, table)
    }

    /// Install a role table read from a CSV file
    pub fn load_roles_csv<P: AsRef<Path>>(&mut self, path: P) -> std::result::Result<(), DefinitionError> {
        let table = RoleTable::from_csv_path(path)?;
        Ok(self.set_roles(&table)?)
    }

    /// Render `q` in the active system, through its role pin if it has one.
    pub fn in_system(&self, q: &Quantity) -> Result<Rendered> {
        match self.by_role(q)? {
            Some(rendered) => Ok(rendered),
            None => self.unitise(q),
        }
    }

    /// Render `q` with the active system's heuristic, ignoring roles.
    pub fn unitise(&self, q: &Quantity) -> Result<Rendered> {
        self.systems.unitise(&self.registry, q.value(), q.spec())
    }

    /// Render `q` through the pin for its role, or `None` if it has no role
    /// or the role has no pin in the active system.
    pub fn by_role(&self, q: &Quantity) -> Result<Option<Rendered>> {
        match q.role() {
            Some(role) => self.pinned(q, role),
            None => Ok(None),
        }
    }

    /// Render `q` through the pin for `role`, failing if nothing is pinned.
    pub fn render_role(&self, q: &Quantity, role: &str) -> Result<Rendered> {
        self.pinned(q, role)?
            .ok_or_else(|| UnitError::UnknownRole(role.to_string()))
    }

    fn pinned(&self, q: &Quantity, role: &str) -> Result<Option<Rendered>> {
        let Some(pin) = self.systems.role_pin(role) else {
            return Ok(None);
        };
        if pin.vector != *q.vector() {
            return Err(UnitError::incompatible(q.vector(), &pin.vector));
        }
        Ok(self.systems.by_role(q.value(), role))
    }

    /// Render `q` in exactly `unit`, or in its own spec when `unit` is `None`.
    pub fn in_units(&self, q: &Quantity, unit: Option<&Unit>) -> Result<Rendered> {
        let spec: &[UnitId] = match unit {
            Some(unit) => {
                if unit.vector() != q.vector() {
                    return Err(UnitError::incompatible(q.vector(), unit.vector()));
                }
                unit.spec()
            }
            None => q.spec(),
        };
        self.systems.unitise_typed(&self.registry, q.value(), spec)
    }

    /// [`UnitContext::in_units`] for a unit expression.
    pub fn in_unit_str(&mut self, q: &Quantity, unit: &str) -> Result<Rendered> {
        let unit = self.registry.lookup(unit)?;
        self.in_units(q, Some(&unit))
    }

    /// Render `q` in the designated base unit of each base dimension.
    pub fn in_base(&self, q: &Quantity) -> Result<Rendered> {
        self.systems
            .base_unitise(&self.registry, q.value(), q.vector(), false)
    }

    /// Render `q` in the bare dimension-type units (`length.mass/time2`).
    pub fn in_dimensions(&self, q: &Quantity) -> Result<Rendered> {
        self.systems
            .base_unitise(&self.registry, q.value(), q.vector(), true)
    }

    /// Parse a unit expression into a spec
    pub fn parse(&self, expression: &str) -> Result<Spec> {
        self.registry.parse_spec(expression)
    }

    /// Canonical expression for a spec
    pub fn format(&self, spec: &[UnitId]) -> String {
        self.registry.format_spec(spec)
    }
}

/// Named unit contexts, one of them active.
#[derive(Debug, Clone, Default)]
pub struct Groups {
    groups: HashMap<String, UnitContext>,
    active: Option<String>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the group `name` and make it active.
    pub fn setup(&mut self, name: &str, context: UnitContext) -> &mut UnitContext {
        tracing::debug!(group = name, "unit group set up");
        self.active = Some(name.to_string());
        self.groups
            .entry(name.to_string())
            .insert_entry(context)
            .into_mut()
    }

    /// [`Groups::setup`] with the bundled definitions.
    pub fn setup_builtin(&mut self, name: &str) -> std::result::Result<&mut UnitContext, DefinitionError> {
        let context = UnitContext::builtin()?;
        Ok(self.setup(name, context))
    }

    /// Get the context set up under `name`
    pub fn get(&self, name: &str) -> Result<&UnitContext> {
        self.groups
            .get(name)
            .ok_or_else(|| UnitError::UnknownGroup(name.to_string()))
    }

    /// Get the context set up under `name` mutably
    pub fn get_mut(&mut self, name: &str) -> Result<&mut UnitContext> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| UnitError::UnknownGroup(name.to_string()))
    }

    /// Names of every group
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Name of the active group
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Make `name` the active group
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        if !self.groups.contains_key(name) {
            return Err(UnitError::UnknownGroup(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// The active group's context
    pub fn active(&self) -> Result<&UnitContext> {
        let name = self.active.as_deref().unwrap_or(DEFAULT_GROUP);
        self.get(name)
    }

    /// The active group's context, mutably
    pub fn active_mut(&mut self) -> Result<&mut UnitContext> {
        let name = self.active.clone().unwrap_or_else(|| DEFAULT_GROUP.to_string());
        self.get_mut(&name)
    }

    /// The active group, setting up the bundled one as [`DEFAULT_GROUP`]
    /// when no group exists yet.
    pub fn active_or_builtin(&mut self) -> std::result::Result<&mut UnitContext, DefinitionError> {
        if self.active.is_none() {
            self.setup_builtin(DEFAULT_GROUP)?;
        }
        Ok(self.active_mut()?)
    }

    /// Switch the unit system of `group`, or of the active group.
    pub fn set_system(&mut self, system: &str, group: Option<&str>) -> Result<()> {
        match group {
            Some(name) => self.get_mut(name)?.set_system(system),
            None => self.active_mut()?.set_system(system),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const UNITS: &str = r#"{
        "base_types": ["length", "mass", "time"],
        "length": { "_base": "m",
                    "m": [1.0, "length", "meter", {"SI_prefixes": ["m"]}],
                    "in": [25.4, "mm", "inch"],
                    "ft": [12, "in", "foot"] },
        "mass": { "_base": "kg",
                  "kg": [1.0, "mass", "kilogram"],
                  "lbs": [0.45359237, "kg", "pound"] },
        "time": { "_base": "s", "s": [1.0, "time", "second"] }
    }"#;

    const SYSTEMS: &str = r#"{
        "metric": { "length": ["mm", "m"], "mass": ["kg"], "time": ["s"] },
        "US": { "length": ["in", "ft"], "mass": ["lbs"], "time": ["s"] }
    }"#;

    fn context() -> UnitContext {
        UnitContext::from_json(UNITS, SYSTEMS).unwrap()
    }

    #[test]
    fn test_first_system_active() {
        let ctx = context();
        assert_eq!(ctx.active_system(), Some("metric"));
    }

    #[test]
    fn test_in_system_switching() {
        let mut ctx = context();
        let q = ctx.quantify(0.0057, "m.kg/s").unwrap();
        let metric = ctx.in_system(&q).unwrap();
        assert_eq!(metric.unit, "kg.mm/s");
        assert_relative_eq!(metric.scalar().unwrap(), 5.7, epsilon = 1e-12);

        ctx.set_system("US").unwrap();
        let us = ctx.in_system(&q).unwrap();
        assert_eq!(us.unit, "in.lbs/s");

        ctx.set_system("metric").unwrap();
        assert_eq!(ctx.in_system(&q).unwrap(), metric);
    }

    #[test]
    fn test_role_pin_overrides_heuristic() {
        let mut ctx = context();
        let mut table = RoleTable::new();
        table.insert("span", "metric", "m");
        ctx.set_roles(&table).unwrap();

        let q = ctx.quantify(5.0, "mm").unwrap().with_role("span");
        let rendered = ctx.in_system(&q).unwrap();
        assert_eq!(rendered.unit, "m");
        assert_relative_eq!(rendered.scalar().unwrap(), 0.005);

        ctx.set_system("US").unwrap();
        let fallback = ctx.in_system(&q).unwrap();
        assert_eq!(fallback.unit, "in");
        assert!(matches!(
            ctx.render_role(&q, "span"),
            Err(UnitError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_role_pin_dimension_mismatch() {
        let mut ctx = context();
        let mut table = RoleTable::new();
        table.insert("span", "metric", "m");
        ctx.set_roles(&table).unwrap();
        let q = ctx.quantify(5.0, "kg").unwrap().with_role("span");
        assert!(matches!(
            ctx.in_system(&q),
            Err(UnitError::IncompatibleDimensions { .. })
        ));
    }

    #[test]
    fn test_in_units() {
        let mut ctx = context();
        let q = ctx.quantify(3.0, "ft").unwrap();
        let own = ctx.in_units(&q, None).unwrap();
        assert_eq!(own.unit, "ft");
        assert_relative_eq!(own.scalar().unwrap(), 3.0, epsilon = 1e-12);

        let inches = ctx.in_unit_str(&q, "in").unwrap();
        assert_relative_eq!(inches.scalar().unwrap(), 36.0, epsilon = 1e-9);

        assert!(matches!(
            ctx.in_unit_str(&q, "kg"),
            Err(UnitError::IncompatibleDimensions { .. })
        ));
    }

    #[test]
    fn test_in_base_and_dimensions() {
        let mut ctx = context();
        let q = ctx.quantify(2.0, "ft/s").unwrap();
        let base = ctx.in_base(&q).unwrap();
        assert_eq!(base.unit, "m/s");
        assert_relative_eq!(base.scalar().unwrap(), 0.6096, epsilon = 1e-12);
        assert_eq!(ctx.in_dimensions(&q).unwrap().unit, "length/time");
    }

    #[test]
    fn test_groups() {
        let mut groups = Groups::new();
        assert!(matches!(groups.active(), Err(UnitError::UnknownGroup(_))));

        groups.setup("plant", context());
        groups.setup("site", context());
        assert_eq!(groups.active_name(), Some("site"));

        groups.set_active("plant").unwrap();
        groups.set_system("US", None).unwrap();
        assert_eq!(groups.get("plant").unwrap().active_system(), Some("US"));
        assert_eq!(groups.get("site").unwrap().active_system(), Some("metric"));

        assert_eq!(
            groups.set_active("office").unwrap_err(),
            UnitError::UnknownGroup("office".to_string())
        );
        assert!(matches!(
            groups.set_system("US", Some("office")),
            Err(UnitError::UnknownGroup(_))
        ));
    }

    #[test]
    fn test_active_or_builtin() {
        let mut groups = Groups::new();
        let ctx = groups.active_or_builtin().unwrap();
        assert_eq!(ctx.active_system(), Some("metric"));
        assert_eq!(groups.active_name(), Some(DEFAULT_GROUP));
    }
}
