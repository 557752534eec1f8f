//! Unit expression strings: `"kg.m/s2"`, `"1/s"`, `"kg/(m.s2)"`.
//!
//! Terms are joined by `.` (or a space); a single trailing digit repeats the
//! preceding unit; at most one `/` separates numerator from denominator and a
//! multi-term denominator is bracketed on output.

use super::Registry;
use crate::types::{Result, Spec, UnitError, UnitId};

impl Registry {
    /// Parse a unit expression into a spec of signed unit ids.
    ///
    /// An empty string or `"dimensionless"` yields an empty spec.
    pub fn parse_spec(&self, input: &str) -> Result<Spec> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" {
            return Ok(Spec::new());
        }

        if let Some(pos) = input.find('-') {
            return Err(UnitError::parse(input, &input[pos..], "negative exponents are not allowed"));
        }
        if let Some(pos) = input.find('^') {
            return Err(UnitError::parse(input, &input[pos..], "power symbols should be omitted"));
        }
        let opens = input.matches('(').count();
        let closes = input.matches(')').count();
        if opens != closes {
            return Err(UnitError::parse(input, input, "mismatched brackets"));
        }
        if opens > 1 {
            let pos = nth_position(input, '(', 1);
            return Err(UnitError::parse(
                input,
                &input[pos..],
                "only one bracketed denominator is allowed",
            ));
        }
        if input.matches('/').count() > 1 {
            let pos = nth_position(input, '/', 1);
            return Err(UnitError::parse(input, &input[pos..], "only one divide symbol is allowed"));
        }

        let (numerator, denominator) = input.split_once('/').unwrap_or((input, ""));
        let numerator = strip_brackets(numerator);
        let denominator = strip_brackets(denominator);
        if numerator.is_empty() && !denominator.is_empty() {
            return Err(UnitError::parse(input, input, "missing numerator"));
        }
        if input.contains('/') && denominator.is_empty() {
            return Err(UnitError::parse(input, input, "missing denominator"));
        }
        let numerator = if numerator == "1" || numerator == "1.0" {
            ""
        } else {
            numerator
        };

        let mut spec = self.parse_terms(input, numerator)?;
        spec.extend(self.parse_terms(input, denominator)?.into_iter().map(|id| -id));
        Ok(spec)
    }

    fn parse_terms(&self, input: &str, part: &str) -> Result<Spec> {
        let mut spec = Spec::new();
        if part.is_empty() {
            return Ok(spec);
        }
        if let Some(pos) = part.find(['(', ')']) {
            return Err(UnitError::parse(input, &part[pos..], "misplaced bracket"));
        }

        for term in part.split(['.', ' ']) {
            if term.is_empty() {
                return Err(UnitError::parse(input, part, "empty unit term"));
            }
            if let Some(id) = self.known(term) {
                spec.push(id);
                continue;
            }

            let (name, count) = split_exponent(term);
            if count == Some(0) {
                return Err(UnitError::parse(input, term, "zero exponent"));
            }
            match (self.known(name), count) {
                (Some(id), Some(n)) if !name.is_empty() => {
                    spec.extend(std::iter::repeat_n(id, n as usize));
                }
                _ => return Err(UnitError::UnitNotFound(term.to_string())),
            }
        }
        Ok(spec)
    }

    /// Id of a unit that may stand as a single term. Cached compound units
    /// such as `m3` are skipped so terms always resolve to typed units.
    fn known(&self, name: &str) -> Option<UnitId> {
        self.get(name)
            .filter(|u| u.dimension_type.is_some())
            .map(|u| u.id)
    }

    /// Canonical expression for `spec`: numerator and denominator names
    /// sorted, repeats collapsed to a digit suffix.
    pub fn format_spec(&self, spec: &[UnitId]) -> String {
        if spec.is_empty() {
            return "dimensionless".to_string();
        }
        let numerator = self.collapse(spec.iter().filter(|&&id| id > 0).copied());
        let denominator = self.collapse(spec.iter().filter(|&&id| id < 0).map(|&id| -id));

        let top = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join(".")
        };
        match denominator.len() {
            0 => top,
            1 => format!("{top}/{}", denominator[0]),
            _ => format!("{top}/({})", denominator.join(".")),
        }
    }

    /// Like [`Registry::format_spec`], rendering an absent spec as `"base"`.
    pub fn format_optional_spec(&self, spec: Option<&[UnitId]>) -> String {
        match spec {
            Some(spec) => self.format_spec(spec),
            None => "base".to_string(),
        }
    }

    fn collapse(&self, ids: impl Iterator<Item = UnitId>) -> Vec<String> {
        let mut names: Vec<String> = ids.map(|id| self.label_of(id)).collect();
        names.sort();

        let mut terms: Vec<(String, usize)> = Vec::new();
        for name in names {
            match terms.last_mut() {
                Some((last, count)) if *last == name => *count += 1,
                _ => terms.push((name, 1)),
            }
        }
        terms
            .into_iter()
            .map(|(name, count)| {
                if count == 1 {
                    name
                } else {
                    format!("{name}{count}")
                }
            })
            .collect()
    }
}

fn strip_brackets(part: &str) -> &str {
    part.trim_matches(|c: char| c == ' ' || c == '(' || c == ')')
}

fn nth_position(input: &str, c: char, n: usize) -> usize {
    input
        .match_indices(c)
        .nth(n)
        .map(|(pos, _)| pos)
        .unwrap_or(0)
}

fn split_exponent(term: &str) -> (&str, Option<u32>) {
    match term.chars().last().and_then(|c| c.to_digit(10)) {
        Some(digit) => (&term[..term.len() - 1], Some(digit)),
        None => (term, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registry {
        let mut reg = Registry::new();
        reg.register_dimension_types(&["length", "mass", "time"]).unwrap();
        reg.define_unit("length", "m", 1.0, &["length"], "meter", &["m"])
            .unwrap();
        reg.define_unit("mass", "kg", 1.0, &["mass"], "kilogram", &[])
            .unwrap();
        reg.define_unit("time", "s", 1.0, &["time"], "second", &[])
            .unwrap();
        reg
    }

    fn ids(reg: &Registry, names: &[&str]) -> Spec {
        names.iter().map(|n| reg.id(n).unwrap()).collect()
    }

    #[test]
    fn test_parse_simple_expressions() {
        let reg = sample();
        assert_eq!(reg.parse_spec("kg.m/s2").unwrap(), ids(&reg, &["kg", "m", "-s", "-s"]));
        assert_eq!(reg.parse_spec("1/s").unwrap(), ids(&reg, &["-s"]));
        assert_eq!(reg.parse_spec("1.0/s").unwrap(), ids(&reg, &["-s"]));
        assert_eq!(reg.parse_spec("kg m").unwrap(), ids(&reg, &["kg", "m"]));
        assert_eq!(reg.parse_spec("kg/(m.s2)").unwrap(), ids(&reg, &["kg", "-m", "-s", "-s"]));
        assert_eq!(reg.parse_spec("mm3").unwrap(), ids(&reg, &["mm", "mm", "mm"]));
    }

    #[test]
    fn test_cached_compound_terms_expand() {
        let mut reg = sample();
        let before = reg.parse_spec("kg/m3").unwrap();
        reg.lookup("m3").unwrap();
        reg.lookup("m.s").unwrap();
        assert_eq!(reg.parse_spec("kg/m3").unwrap(), before);
        assert_eq!(before, ids(&reg, &["kg", "-m", "-m", "-m"]));
        assert_eq!(reg.parse_spec("m3.s").unwrap(), ids(&reg, &["m", "m", "m", "s"]));
    }

    #[test]
    fn test_parse_dimensionless() {
        let reg = sample();
        assert!(reg.parse_spec("").unwrap().is_empty());
        assert!(reg.parse_spec("dimensionless").unwrap().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        let reg = sample();
        let cases = ["m^2", "kg.-m", "kg/(m.s", "kg/(m)/(s)", "kg/m/s", "kg..m", "/s", "kg/"];
        for case in cases {
            let err = reg.parse_spec(case).unwrap_err();
            assert!(
                matches!(err, UnitError::ParseError { .. }),
                "expected parse error for {case}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_unknown_unit() {
        let reg = sample();
        assert_eq!(
            reg.parse_spec("xyz").unwrap_err(),
            UnitError::UnitNotFound("xyz".to_string())
        );
        assert_eq!(
            reg.parse_spec("kg.furlong2").unwrap_err(),
            UnitError::UnitNotFound("furlong2".to_string())
        );
        assert_eq!(
            reg.parse_spec("2").unwrap_err(),
            UnitError::UnitNotFound("2".to_string())
        );
    }

    #[test]
    fn test_format_spec() {
        let reg = sample();
        assert_eq!(reg.format_spec(&ids(&reg, &["m", "kg", "-s", "-s"])), "kg.m/s2");
        assert_eq!(reg.format_spec(&ids(&reg, &["-s"])), "1/s");
        assert_eq!(reg.format_spec(&ids(&reg, &["kg", "-s", "-m"])), "kg/(m.s)");
        assert_eq!(reg.format_spec(&[]), "dimensionless");
        assert_eq!(reg.format_optional_spec(None), "base");
    }

    #[test]
    fn test_format_then_parse_preserves_multiset() {
        let reg = sample();
        let spec = ids(&reg, &["s", "kg", "-m", "s", "-mm"]);
        let text = reg.format_spec(&spec);
        assert_eq!(text, "kg.s2/(m.mm)");

        let mut parsed = reg.parse_spec(&text).unwrap();
        let mut expected = spec.clone();
        parsed.sort();
        expected.sort();
        assert_eq!(parsed, expected);
    }
}
