//! Labelled values such as `"widget.length [mm]"`: a name with its unit in
//! trailing brackets.

use crate::context::UnitContext;
use crate::quantity::Quantity;
use crate::types::{Magnitude, Result};

/// Split `"name [unit]"` into its trimmed parts. `None` if there are no
/// trailing brackets.
pub fn split_label(label: &str) -> Option<(&str, &str)> {
    let body = label.trim_end().strip_suffix(']')?;
    let open = body.rfind('[')?;
    Some((body[..open].trim(), body[open + 1..].trim()))
}

/// `"name [unit]"`, or `"[unit]"` for an empty name.
pub fn add_unit_label(name: &str, unit: &str) -> String {
    if name.is_empty() {
        format!("[{unit}]")
    } else {
        format!("{name} [{unit}]")
    }
}

impl UnitContext {
    /// Quantify `value` in the unit named by `label`. The label body becomes
    /// the quantity's role. A label without brackets is read as a bare unit.
    pub fn make_labelled(&mut self, label: &str, value: impl Into<Magnitude>) -> Result<Quantity> {
        match split_label(label) {
            Some((name, unit)) => {
                let q = self.quantify(value, unit)?;
                Ok(if name.is_empty() { q } else { q.with_role(name) })
            }
            None => self.quantify(value, label.trim()),
        }
    }

    /// Render `q` in the active system as a `(label, value)` pair, labelled
    /// with `name` or else the quantity's role.
    pub fn split_labelled(&self, q: &Quantity, name: Option<&str>) -> Result<(String, Magnitude)> {
        let rendered = self.in_system(q)?;
        let name = name.or(q.role()).unwrap_or_default();
        Ok((add_unit_label(name, &rendered.unit), rendered.value))
    }

    /// Re-express a labelled value in the active system. Pairs that cannot be
    /// converted come back unchanged.
    pub fn transform_pair(&mut self, label: &str, value: Magnitude) -> (String, Magnitude) {
        let converted = self
            .make_labelled(label, value.clone())
            .and_then(|q| self.split_labelled(&q, None));
        match converted {
            Ok(pair) => pair,
            Err(err) => {
                tracing::debug!(label, error = %err, "labelled value left unconverted");
                (label.to_string(), value)
            }
        }
    }

    /// [`UnitContext::transform_pair`] over every pair, keeping order.
    pub fn transform_pairs<I, S>(&mut self, pairs: I) -> Vec<(String, Magnitude)>
    where
        I: IntoIterator<Item = (S, Magnitude)>,
        S: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(label, value)| self.transform_pair(label.as_ref(), value))
            .collect()
    }
}
