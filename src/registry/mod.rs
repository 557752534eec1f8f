//! The unit registry: dimension types, named units and their inverses.

mod definition;
mod expression;
pub mod prefix;
mod unit;

use std::collections::HashMap;
use std::ops::Index;

pub use definition::{BaseSpec, DimensionGroup, Derivation, UnitDefinition, UnitEntry};
pub use unit::Unit;

use crate::types::{DimensionVector, Result, Spec, UnitError, UnitId};

/// Characters that carry meaning in unit expressions and so may not appear in
/// a defined abbreviation.
const RESERVED: &[char] = &['-', '/', '.', '(', ')', '^', ' '];

/// Owns every unit and dimension type known to one unit group.
///
/// Ids are allocated in pairs: name `x` gets a positive id and `-x` the
/// matching negative id. Units synthesized from expressions are cached here
/// under the expression string.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    ids: HashMap<String, UnitId>,
    labels: HashMap<UnitId, String>,
    units: HashMap<UnitId, Unit>,
    base_types: Vec<UnitId>,
    derived_types: Vec<UnitId>,
    bases: HashMap<UnitId, UnitId>,
}

impl Registry {
    /// Create an empty registry with no dimension types
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, allocating the `name`/`-name` pair on first use.
    pub(crate) fn intern(&mut self, name: &str) -> UnitId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = (self.labels.len() / 2 + 1) as UnitId;
        let inverse = format!("-{name}");
        self.ids.insert(name.to_string(), id);
        self.ids.insert(inverse.clone(), -id);
        self.labels.insert(id, name.to_string());
        self.labels.insert(-id, inverse);
        id
    }

    /// Register the base dimension types, in vector-slot order. Each gets a
    /// one-hot vector and a type unit of value 1 named after the type.
    pub fn register_dimension_types<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if !self.base_types.is_empty() {
            return Err(UnitError::InvalidOperation(
                "base dimension types are already registered".to_string(),
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|n| n.as_ref() == name.as_ref()) {
                return Err(UnitError::DuplicateDefinition(name.as_ref().to_string()));
            }
        }

        let len = names.len();
        for (slot, name) in names.iter().enumerate() {
            let name = name.as_ref();
            check_abbreviation(name)?;
            let id = self.intern(name);
            self.insert_pair(id, 1.0, DimensionVector::unit(len, slot), vec![id], name, Some(id))?;
            self.base_types.push(id);
        }
        tracing::debug!(count = len, "registered base dimension types");
        Ok(())
    }

    /// Register a named type for units that are products of base dimensions
    /// (force, pressure, ...). It owns no vector slot and no type unit.
    pub fn register_derived_type(&mut self, name: &str) -> Result<UnitId> {
        check_abbreviation(name)?;
        if self.dimension_type_id(name).is_ok() || self.get(name).is_some() {
            return Err(UnitError::DuplicateDefinition(name.to_string()));
        }
        let id = self.intern(name);
        self.derived_types.push(id);
        Ok(id)
    }

    /// Define a unit of `dimension_type` as `multiplier` times the product of
    /// the `derivation` units, plus one prefixed variant per SI prefix
    /// symbol. Each definition also registers its inverse.
    pub fn define_unit(
        &mut self,
        dimension_type: &str,
        abbreviation: &str,
        multiplier: f64,
        derivation: &[&str],
        name: &str,
        prefixes: &[&str],
    ) -> Result<UnitId> {
        let type_id = self.dimension_type_id(dimension_type)?;
        check_abbreviation(abbreviation)?;
        if self.get(abbreviation).is_some() || self.dimension_type_id(abbreviation).is_ok() {
            return Err(UnitError::DuplicateDefinition(abbreviation.to_string()));
        }

        let prefixes = prefixes
            .iter()
            .map(|&symbol| {
                prefix::find(symbol).ok_or_else(|| UnitError::UnknownPrefix {
                    prefix: symbol.to_string(),
                    unit: abbreviation.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        for p in &prefixes {
            let prefixed = format!("{}{}", p.symbol, abbreviation);
            if self.get(&prefixed).is_some() {
                return Err(UnitError::DuplicateDefinition(prefixed));
            }
        }

        let (factor, vector) = self.derive(derivation)?;
        let value = multiplier * factor;

        let id = self.intern(abbreviation);
        self.insert_pair(id, value, vector.clone(), vec![id], name, Some(type_id))?;

        for p in prefixes {
            let prefixed = format!("{}{}", p.symbol, abbreviation);
            let prefixed_id = self.intern(&prefixed);
            self.insert_pair(
                prefixed_id,
                value * p.factor,
                vector.clone(),
                vec![prefixed_id],
                &format!("{}{}", p.name, name),
                Some(type_id),
            )?;
        }

        tracing::trace!(unit = abbreviation, value, "defined unit");
        Ok(id)
    }

    /// Mark `abbreviation` as the base unit of `dimension_type`.
    pub fn designate_base(&mut self, dimension_type: &str, abbreviation: &str) -> Result<()> {
        let type_id = self.dimension_type_id(dimension_type)?;
        let unit = self
            .get(abbreviation)
            .ok_or_else(|| UnitError::UnitNotFound(abbreviation.to_string()))?;
        if unit.dimension_type != Some(type_id) {
            return Err(UnitError::InvalidOperation(format!(
                "unit '{abbreviation}' does not belong to dimension type '{dimension_type}'"
            )));
        }
        let id = unit.id;
        self.bases.insert(type_id, id);
        Ok(())
    }

    /// Fails with `IncompleteSpecification` if any dimension type has no units.
    pub fn verify_complete(&self) -> Result<()> {
        for &type_id in self.base_types.iter().chain(&self.derived_types) {
            let populated = self
                .units
                .values()
                .any(|u| u.id > 0 && u.id != type_id && u.dimension_type == Some(type_id));
            if !populated {
                return Err(UnitError::IncompleteSpecification(self.label_of(type_id)));
            }
        }
        Ok(())
    }

    /// Resolve `token` to a unit, synthesizing and caching a compound unit
    /// when `token` is a valid expression over known units.
    pub fn lookup(&mut self, token: &str) -> Result<Unit> {
        if let Some(unit) = self.get(token) {
            return Ok(unit.clone());
        }
        let spec = self.parse_spec(token)?;
        let (value, vector) = self.combine(&spec)?;
        let id = self.intern(token);
        self.insert_pair(id, value, vector, spec, token, None)?;
        tracing::debug!(expression = token, id, "synthesized compound unit");
        self.get_by_id(id)
            .cloned()
            .ok_or_else(|| UnitError::UnitNotFound(token.to_string()))
    }

    /// Get a registered unit by abbreviation
    pub fn get(&self, abbreviation: &str) -> Option<&Unit> {
        self.ids.get(abbreviation).and_then(|id| self.units.get(id))
    }

    /// Get a registered unit by signed id
    pub fn get_by_id(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Signed id allocated to `name`, if any
    pub fn id(&self, name: &str) -> Option<UnitId> {
        self.ids.get(name).copied()
    }

    /// Name the id was allocated for
    pub fn label(&self, id: UnitId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub(crate) fn label_of(&self, id: UnitId) -> String {
        self.label(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{id}"))
    }

    /// Check if a unit is registered under `abbreviation`
    pub fn contains(&self, abbreviation: &str) -> bool {
        self.get(abbreviation).is_some()
    }

    /// Positive id of a registered base or derived dimension type.
    pub fn dimension_type_id(&self, name: &str) -> Result<UnitId> {
        self.ids
            .get(name)
            .copied()
            .filter(|id| self.base_types.contains(id) || self.derived_types.contains(id))
            .ok_or_else(|| UnitError::UnitNotFound(name.to_string()))
    }

    /// Signed dimension type of unit `id`, if it has one.
    pub fn dimension_type_of(&self, id: UnitId) -> Option<UnitId> {
        self.units.get(&id).and_then(|u| u.dimension_type)
    }

    /// Base dimension type ids, in vector-slot order
    pub fn base_type_ids(&self) -> &[UnitId] {
        &self.base_types
    }

    /// Derived dimension type ids, in registration order
    pub fn derived_type_ids(&self) -> &[UnitId] {
        &self.derived_types
    }

    /// Number of base dimensions, i.e. the length of every dimension vector.
    pub fn dimension_count(&self) -> usize {
        self.base_types.len()
    }

    /// Designated base unit of the (positive) dimension type `type_id`.
    pub fn base_of(&self, type_id: UnitId) -> Option<UnitId> {
        self.bases.get(&type_id).copied()
    }

    /// The vector every unit of `type_id` must carry, when one is known.
    pub fn reference_vector(&self, type_id: UnitId) -> Option<&DimensionVector> {
        if self.base_types.contains(&type_id) {
            return self.units.get(&type_id).map(|u| &u.vector);
        }
        self.base_of(type_id)
            .and_then(|id| self.units.get(&id))
            .map(|u| &u.vector)
    }

    /// Iterate over every registered unit, inverses included
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of registered units, inverses included
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total value and vector of the product of `spec`.
    pub fn combine(&self, spec: &[UnitId]) -> Result<(f64, DimensionVector)> {
        let mut value = 1.0;
        let mut vector = DimensionVector::zeros(self.dimension_count());
        for &id in spec {
            let unit = self
                .get_by_id(id)
                .ok_or_else(|| UnitError::UnitNotFound(self.label_of(id)))?;
            value *= unit.value;
            vector = &vector + &unit.vector;
        }
        Ok((value, vector))
    }

    fn derive(&mut self, derivation: &[&str]) -> Result<(f64, DimensionVector)> {
        let mut value = 1.0;
        let mut vector = DimensionVector::zeros(self.dimension_count());
        for &token in derivation {
            if token.starts_with('-') && self.get(token).is_none() {
                return Err(UnitError::UnitNotFound(token.to_string()));
            }
            let unit = self.lookup(token)?;
            value *= unit.value;
            vector = &vector + &unit.vector;
        }
        Ok((value, vector))
    }

    fn insert_pair(
        &mut self,
        id: UnitId,
        value: f64,
        vector: DimensionVector,
        spec: Spec,
        name: &str,
        dimension_type: Option<UnitId>,
    ) -> Result<()> {
        let inverse_spec: Spec = spec.iter().map(|s| -s).collect();
        let inverse_vector = -&vector;
        self.insert_one(id, value, vector, spec, name.to_string(), dimension_type)?;
        self.insert_one(
            -id,
            1.0 / value,
            inverse_vector,
            inverse_spec,
            format!("per {name}"),
            dimension_type.map(|t| -t),
        )
    }

    fn insert_one(
        &mut self,
        id: UnitId,
        value: f64,
        vector: DimensionVector,
        spec: Spec,
        name: String,
        dimension_type: Option<UnitId>,
    ) -> Result<()> {
        let abbreviation = self.label_of(id);
        if self.units.contains_key(&id) {
            return Err(UnitError::DuplicateDefinition(abbreviation));
        }
        self.units.insert(
            id,
            Unit {
                id,
                abbreviation,
                name,
                value,
                spec,
                vector,
                dimension_type,
            },
        );
        Ok(())
    }
}

fn check_abbreviation(abbreviation: &str) -> Result<()> {
    if abbreviation.is_empty() {
        return Err(UnitError::parse(abbreviation, abbreviation, "empty unit name"));
    }
    if let Some(pos) = abbreviation.find(RESERVED) {
        return Err(UnitError::parse(
            abbreviation,
            &abbreviation[pos..],
            "unit names may not contain operator characters",
        ));
    }
    Ok(())
}

impl Index<&str> for Registry {
    type Output = Unit;

    /// # Panics
    /// Panics if no unit is registered under `abbreviation`.
    fn index(&self, abbreviation: &str) -> &Unit {
        match self.get(abbreviation) {
            Some(unit) => unit,
            None => panic!("unit '{abbreviation}' is not registered"),
        }
    }
}
