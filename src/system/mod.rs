//! Unit systems: choosing presentation units and converting into them.

mod definition;
mod roles;

use std::collections::HashMap;

pub use definition::{CandidateSpec, SystemsDefinition};
pub use roles::RoleTable;

use crate::display::Rendered;
use crate::registry::Registry;
use crate::types::{DefinitionError, DimensionVector, Magnitude, Result, UnitError, UnitId};

/// A presentation unit offered for one dimension type. `factor` is the
/// scoring size, which differs from the unit's value for `[n, unit]` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub unit: UnitId,
    pub factor: f64,
}

/// A named presentation policy: candidate units per dimension type.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    name: String,
    candidates: HashMap<UnitId, Vec<Candidate>>,
}

impl System {
    /// Create a system with no candidates
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install the candidate list for `dimension_type`, given in order of
    /// preference. Every candidate must share one dimension vector.
    pub fn set_candidates(
        &mut self,
        registry: &mut Registry,
        dimension_type: &str,
        specs: &[CandidateSpec],
    ) -> Result<()> {
        let type_id = registry.dimension_type_id(dimension_type)?;
        let mut reference: Option<DimensionVector> = registry.reference_vector(type_id).cloned();

        let mut candidates = Vec::with_capacity(specs.len());
        for spec in specs {
            let unit = registry.lookup(spec.abbreviation())?;
            match &reference {
                Some(vector) if vector != unit.vector() => {
                    return Err(UnitError::incompatible(vector, unit.vector()));
                }
                Some(_) => {}
                None => reference = Some(unit.vector().clone()),
            }
            candidates.push(Candidate {
                unit: unit.id(),
                factor: spec.multiplier() * unit.value(),
            });
        }
        candidates.reverse();
        self.candidates.insert(type_id, candidates);
        Ok(())
    }

    /// Candidates for a (positive) dimension type, in scan order.
    pub fn candidates(&self, type_id: UnitId) -> Option<&[Candidate]> {
        self.candidates.get(&type_id).map(Vec::as_slice)
    }

    /// Pick the candidate whose converted magnitude lies closest to the
    /// decade 1..10, scoring `max(mean|v|, mean(10/|v|))`. A negative
    /// `dimension_type` selects an inverse unit. Ties keep the earliest
    /// candidate in scan order, i.e. the one declared last.
    pub fn choose_presentation_unit(&self, value: &Magnitude, dimension_type: UnitId) -> Option<UnitId> {
        let candidates = self.candidates.get(&dimension_type.abs())?;
        let divide = dimension_type < 0;

        let mut best: Option<(f64, UnitId)> = None;
        for candidate in candidates {
            let trial = if divide {
                value.scale(candidate.factor)
            } else {
                value.map(|v| v / candidate.factor)
            };
            let score = trial
                .mean_of(f64::abs)
                .max(trial.mean_of(|v| 10.0 / v.abs()));
            let id = if divide { -candidate.unit } else { candidate.unit };
            match best {
                Some((best_score, _)) if score >= best_score || score.is_nan() => {}
                _ => best = Some((score, id)),
            }
        }
        best.map(|(_, id)| id)
    }

    /// Convert `value` term by term through `spec`, choosing a presentation
    /// unit for each term from this system. Terms whose type has no
    /// candidates keep their own unit.
    pub fn unitise(&self, registry: &Registry, value: &Magnitude, spec: &[UnitId]) -> Result<Rendered> {
        let mut current = value.clone();
        let mut chosen = Vec::with_capacity(spec.len());
        for &id in spec {
            let target = registry
                .dimension_type_of(id)
                .and_then(|t| self.choose_presentation_unit(&current, t))
                .unwrap_or(id);
            let unit = registry
                .get_by_id(target)
                .ok_or_else(|| UnitError::UnitNotFound(registry.label_of(target)))?;
            current = unit.convert_magnitude(&current);
            chosen.push(target);
        }
        Ok(Rendered::new(current, registry.format_spec(&chosen)))
    }

    /// Convert `value` into exactly the units of `spec`, without searching.
    pub fn unitise_typed(&self, registry: &Registry, value: &Magnitude, spec: &[UnitId]) -> Result<Rendered> {
        let (factor, _) = registry.combine(spec)?;
        Ok(Rendered::new(
            value.map(|v| v / factor),
            registry.format_spec(spec),
        ))
    }

    /// Convert straight from a dimension vector into each base dimension's
    /// designated base unit, or into the dimension-type unit itself when
    /// `dimensional` is set.
    pub fn base_unitise(
        &self,
        registry: &Registry,
        value: &Magnitude,
        vector: &DimensionVector,
        dimensional: bool,
    ) -> Result<Rendered> {
        let base_types = registry.base_type_ids();
        if vector.len() > base_types.len() {
            return Err(UnitError::InvalidOperation(format!(
                "dimension vector {vector} is longer than the registry's {} base types",
                base_types.len()
            )));
        }

        let mut current = value.clone();
        let mut chosen = Vec::new();
        for (&exponent, &type_id) in vector.exponents().iter().zip(base_types) {
            let target = if dimensional {
                type_id
            } else {
                registry.base_of(type_id).unwrap_or(type_id)
            };
            let signed = if exponent < 0 { -target } else { target };
            let unit = registry
                .get_by_id(signed)
                .ok_or_else(|| UnitError::UnitNotFound(registry.label_of(signed)))?;
            for _ in 0..exponent.unsigned_abs() {
                current = unit.convert_magnitude(&current);
                chosen.push(signed);
            }
        }
        Ok(Rendered::new(current, registry.format_spec(&chosen)))
    }
}

/// A unit pinned to a role in one system.
#[derive(Debug, Clone, PartialEq)]
pub struct RolePin {
    pub expression: String,
    pub value: f64,
    pub vector: DimensionVector,
}

/// The loaded unit systems, one of them active.
#[derive(Debug, Clone, Default)]
pub struct Systems {
    systems: Vec<System>,
    active: usize,
    roles: HashMap<String, HashMap<String, RolePin>>,
}

impl Systems {
    /// Create an empty set of systems with none active
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every system in `definition`. The first one becomes active.
    pub fn from_definition(registry: &mut Registry, definition: &SystemsDefinition) -> Result<Self> {
        let mut systems = Systems::new();
        for (name, types) in definition.systems.iter() {
            let mut system = System::new(name);
            for (dimension_type, specs) in types.iter() {
                system.set_candidates(registry, dimension_type, specs)?;
            }
            systems.push(system)?;
        }
        tracing::info!(systems = systems.len(), active = systems.active_name(), "unit systems loaded");
        Ok(systems)
    }

    /// Load systems from a JSON document
    pub fn from_json_str(registry: &mut Registry, json: &str) -> std::result::Result<Self, DefinitionError> {
        let definition = SystemsDefinition::from_json_str(json)?;
        Ok(Self::from_definition(registry, &definition)?)
    }

    /// Load systems from a TOML document
    pub fn from_toml_str(registry: &mut Registry, toml: &str) -> std::result::Result<Self, DefinitionError> {
        let definition = SystemsDefinition::from_toml_str(toml)?;
        Ok(Self::from_definition(registry, &definition)?)
    }

    /// The bundled `metric` and `US` systems, resolved against `registry`.
    pub fn builtin(registry: &mut Registry) -> std::result::Result<Self, DefinitionError> {
        let definition = SystemsDefinition::builtin()?;
        Ok(Self::from_definition(registry, &definition)?)
    }

    /// Add a system. Fails if one with the same name is loaded
    pub fn push(&mut self, system: System) -> Result<()> {
        if self.get(system.name()).is_some() {
            return Err(UnitError::DuplicateDefinition(system.name().to_string()));
        }
        self.systems.push(system);
        Ok(())
    }

    /// Get a loaded system by name
    pub fn get(&self, name: &str) -> Option<&System> {
        self.systems.iter().find(|s| s.name == name)
    }

    /// Names of the loaded systems, in load order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.name.as_str())
    }

    /// Number of loaded systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// The active system
    pub fn active(&self) -> Result<&System> {
        self.systems.get(self.active).ok_or(UnitError::NoActiveSystem)
    }

    /// Name of the active system
    pub fn active_name(&self) -> Option<&str> {
        self.systems.get(self.active).map(|s| s.name.as_str())
    }

    /// Make `name` the active system
    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let index = self
            .systems
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| UnitError::UnknownSystem(name.to_string()))?;
        self.active = index;
        tracing::debug!(system = name, "active unit system changed");
        Ok(())
    }

    /// [`System::unitise`] with the active system
    pub fn unitise(&self, registry: &Registry, value: &Magnitude, spec: &[UnitId]) -> Result<Rendered> {
        self.active()?.unitise(registry, value, spec)
    }

    /// [`System::unitise_typed`] with the active system
    pub fn unitise_typed(&self, registry: &Registry, value: &Magnitude, spec: &[UnitId]) -> Result<Rendered> {
        self.active()?.unitise_typed(registry, value, spec)
    }

    /// [`System::base_unitise`] with the active system
    pub fn base_unitise(
        &self,
        registry: &Registry,
        value: &Magnitude,
        vector: &DimensionVector,
        dimensional: bool,
    ) -> Result<Rendered> {
        self.active()?.base_unitise(registry, value, vector, dimensional)
    }

    /// Resolve and install a role table, replacing any previous pins. Pins
    /// for systems that are not loaded are kept for later.
    pub fn set_roles(&mut self, registry: &mut Registry, table: &RoleTable) -> Result<()> {
        let mut roles: HashMap<String, HashMap<String, RolePin>> = HashMap::new();
        for (role, system, expression) in table.iter() {
            let unit = registry.lookup(expression)?;
            roles.entry(role.to_string()).or_default().insert(
                system.to_string(),
                RolePin {
                    expression: expression.to_string(),
                    value: unit.value(),
                    vector: unit.vector().clone(),
                },
            );
        }
        tracing::debug!(roles = roles.len(), "role table installed");
        self.roles = roles;
        Ok(())
    }

    /// The pin for `role` in the active system.
    pub fn role_pin(&self, role: &str) -> Option<&RolePin> {
        let system = self.active_name()?;
        self.roles.get(role)?.get(system)
    }

    /// Convert `value` with the unit pinned to `role` in the active system,
    /// or `None` when nothing is pinned.
    pub fn by_role(&self, value: &Magnitude, role: &str) -> Option<Rendered> {
        let pin = self.role_pin(role)?;
        Some(Rendered::new(
            value.map(|v| v / pin.value),
            pin.expression.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register_dimension_types(&["length", "mass", "time"]).unwrap();
        reg.define_unit("length", "m", 1.0, &["length"], "meter", &["k", "m"])
            .unwrap();
        reg.define_unit("length", "in", 0.0254, &["m"], "inch", &[])
            .unwrap();
        reg.define_unit("length", "ft", 12.0, &["in"], "foot", &[])
            .unwrap();
        reg.define_unit("mass", "kg", 1.0, &["mass"], "kilogram", &[])
            .unwrap();
        reg.define_unit("mass", "lbs", 0.45359237, &["kg"], "pound", &[])
            .unwrap();
        reg.define_unit("time", "s", 1.0, &["time"], "second", &[])
            .unwrap();
        reg.designate_base("length", "m").unwrap();
        reg.designate_base("mass", "kg").unwrap();
        reg.designate_base("time", "s").unwrap();
        reg
    }

    fn metric(reg: &mut Registry) -> System {
        let mut system = System::new("metric");
        let length = [
            CandidateSpec::Unit("mm".into()),
            CandidateSpec::Unit("m".into()),
            CandidateSpec::Unit("km".into()),
        ];
        system.set_candidates(reg, "length", &length).unwrap();
        system
            .set_candidates(reg, "mass", &[CandidateSpec::Unit("kg".into())])
            .unwrap();
        system
            .set_candidates(reg, "time", &[CandidateSpec::Unit("s".into())])
            .unwrap();
        system
    }

    #[test]
    fn test_candidates_reversed_at_load() {
        let mut reg = registry();
        let system = metric(&mut reg);
        let length = reg.dimension_type_id("length").unwrap();
        let ids: Vec<UnitId> = system.candidates(length).unwrap().iter().map(|c| c.unit).collect();
        assert_eq!(ids, vec![reg.id("km").unwrap(), reg.id("m").unwrap(), reg.id("mm").unwrap()]);
    }

    #[test]
    fn test_choose_presentation_unit() {
        let mut reg = registry();
        let system = metric(&mut reg);
        let length = reg.dimension_type_id("length").unwrap();
        let pick = |v: f64| system.choose_presentation_unit(&Magnitude::Scalar(v), length);
        assert_eq!(pick(0.0057), reg.id("mm"));
        assert_eq!(pick(3.0), reg.id("m"));
        assert_eq!(pick(25_000.0), reg.id("km"));
        assert_eq!(
            system.choose_presentation_unit(&Magnitude::Scalar(0.5), -length),
            Some(-reg.id("m").unwrap())
        );
        let time = reg.dimension_type_id("time").unwrap();
        assert_eq!(
            System::new("empty").choose_presentation_unit(&Magnitude::Scalar(1.0), time),
            None
        );
    }

    #[test]
    fn test_ties_go_to_last_declared_candidate() {
        let mut reg = registry();
        reg.define_unit("length", "metre", 1.0, &["m"], "metre", &[])
            .unwrap();
        let length = reg.dimension_type_id("length").unwrap();

        let mut system = System::new("tied");
        let specs = [CandidateSpec::Unit("m".into()), CandidateSpec::Unit("metre".into())];
        system.set_candidates(&mut reg, "length", &specs).unwrap();
        let value = Magnitude::Scalar(4.0);
        assert_eq!(system.choose_presentation_unit(&value, length), reg.id("metre"));

        let specs = [CandidateSpec::Unit("metre".into()), CandidateSpec::Unit("m".into())];
        system.set_candidates(&mut reg, "length", &specs).unwrap();
        assert_eq!(system.choose_presentation_unit(&value, length), reg.id("m"));
        assert_eq!(
            system.choose_presentation_unit(&value, -length),
            Some(-reg.id("m").unwrap())
        );
    }

    #[test]
    fn test_array_heuristic_uses_mean() {
        let mut reg = registry();
        let system = metric(&mut reg);
        let length = reg.dimension_type_id("length").unwrap();
        let values = Magnitude::array(&[0.002, 0.004, 0.009]);
        assert_eq!(system.choose_presentation_unit(&values, length), reg.id("mm"));
    }

    #[test]
    fn test_multiple_candidate_scores_scaled() {
        let mut reg = registry();
        let mut system = System::new("US");
        let specs = [
            CandidateSpec::Unit("in".into()),
            CandidateSpec::Multiple(3.0, "ft".into()),
        ];
        system.set_candidates(&mut reg, "length", &specs).unwrap();
        let length = reg.dimension_type_id("length").unwrap();
        let ft = system.candidates(length).unwrap()[0].clone();
        assert_eq!(ft.unit, reg.id("ft").unwrap());
        assert_relative_eq!(ft.factor, 3.0 * 0.3048, epsilon = 1e-12);

        // 1 ft scores as a third of 3 ft, so inches still win.
        let one_foot = Magnitude::Scalar(0.3048);
        assert_eq!(system.choose_presentation_unit(&one_foot, length), reg.id("in"));
        let ten_feet = Magnitude::Scalar(3.048);
        assert_eq!(system.choose_presentation_unit(&ten_feet, length), reg.id("ft"));
    }

    #[test]
    fn test_incompatible_candidate_rejected() {
        let mut reg = registry();
        let mut system = System::new("broken");
        let err = system
            .set_candidates(&mut reg, "length", &[CandidateSpec::Unit("kg".into())])
            .unwrap_err();
        assert!(matches!(err, UnitError::IncompatibleDimensions { .. }));
    }

    #[test]
    fn test_unitise() {
        let mut reg = registry();
        let system = metric(&mut reg);
        let spec = reg.parse_spec("m.kg/s").unwrap();
        let rendered = system
            .unitise(&reg, &Magnitude::Scalar(0.0057), &spec)
            .unwrap();
        assert_relative_eq!(rendered.scalar().unwrap(), 5.7, epsilon = 1e-12);
        assert_eq!(rendered.unit, "kg.mm/s");
    }

    #[test]
    fn test_unitise_keeps_units_without_candidates() {
        let mut reg = registry();
        let mut system = System::new("lengths only");
        system
            .set_candidates(&mut reg, "length", &[CandidateSpec::Unit("mm".into())])
            .unwrap();
        let spec = reg.parse_spec("lbs/m").unwrap();
        let rendered = system
            .unitise(&reg, &Magnitude::Scalar(1.0), &spec)
            .unwrap();
        assert_eq!(rendered.unit, "lbs/mm");
        assert_relative_eq!(rendered.scalar().unwrap(), 0.001 / 0.45359237, max_relative = 1e-12);
    }

    #[test]
    fn test_unitise_typed() {
        let reg = registry();
        let system = System::new("any");
        let spec = reg.parse_spec("ft/s").unwrap();
        let rendered = system
            .unitise_typed(&reg, &Magnitude::Scalar(0.6096), &spec)
            .unwrap();
        assert_relative_eq!(rendered.scalar().unwrap(), 2.0, epsilon = 1e-12);
        assert_eq!(rendered.unit, "ft/s");
    }

    #[test]
    fn test_base_unitise() {
        let reg = registry();
        let system = System::new("any");
        let vector = DimensionVector::from_exponents(&[1, 1, -2]);
        let base = system
            .base_unitise(&reg, &Magnitude::Scalar(9.5), &vector, false)
            .unwrap();
        assert_eq!(base.unit, "kg.m/s2");
        assert_relative_eq!(base.scalar().unwrap(), 9.5);

        let dimensional = system
            .base_unitise(&reg, &Magnitude::Scalar(9.5), &vector, true)
            .unwrap();
        assert_eq!(dimensional.unit, "length.mass/time2");

        let none = system
            .base_unitise(&reg, &Magnitude::Scalar(2.0), &DimensionVector::zeros(3), false)
            .unwrap();
        assert_eq!(none.unit, "dimensionless");
    }

    #[test]
    fn test_systems_active_switching() {
        let mut reg = registry();
        let mut systems = Systems::new();
        assert_eq!(systems.active().unwrap_err(), UnitError::NoActiveSystem);

        systems.push(metric(&mut reg)).unwrap();
        systems.push(System::new("US")).unwrap();
        assert_eq!(systems.active_name(), Some("metric"));
        systems.set_active("US").unwrap();
        assert_eq!(systems.active_name(), Some("US"));
        assert_eq!(
            systems.set_active("imperial").unwrap_err(),
            UnitError::UnknownSystem("imperial".to_string())
        );
        assert_eq!(systems.active_name(), Some("US"));
        assert!(matches!(
            systems.push(System::new("US")),
            Err(UnitError::DuplicateDefinition(_))
        ));
    }

    #[test]
    fn test_by_role() {
        let mut reg = registry();
        let mut systems = Systems::new();
        systems.push(metric(&mut reg)).unwrap();
        systems.push(System::new("US")).unwrap();

        let mut table = RoleTable::new();
        table.insert("widget_length", "metric", "mm");
        table.insert("widget_length", "US", "in");
        systems.set_roles(&mut reg, &table).unwrap();

        let value = Magnitude::Scalar(0.254);
        let metric = systems.by_role(&value, "widget_length").unwrap();
        assert_relative_eq!(metric.scalar().unwrap(), 254.0, epsilon = 1e-9);
        assert_eq!(metric.unit, "mm");

        systems.set_active("US").unwrap();
        let us = systems.by_role(&value, "widget_length").unwrap();
        assert_relative_eq!(us.scalar().unwrap(), 10.0, epsilon = 1e-9);
        assert_eq!(us.unit, "in");

        assert!(systems.by_role(&value, "other").is_none());
    }

    #[test]
    fn test_unknown_role_unit_fails_at_install() {
        let mut reg = registry();
        let mut systems = Systems::new();
        let mut table = RoleTable::new();
        table.insert("widget_length", "metric", "furlong");
        assert_eq!(
            systems.set_roles(&mut reg, &table).unwrap_err(),
            UnitError::UnitNotFound("furlong".to_string())
        );
    }
}
