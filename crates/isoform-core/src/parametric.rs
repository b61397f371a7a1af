//! Named, bounded parameters and models rebuilt from them
//!
//! A [`ParametricModel`] owns its parameters and a build function. Every
//! change that actually alters a value bumps a revision counter, and the
//! cached field is rebuilt on the next read whenever its revision is stale,
//! so readers always see a field built from the latest values.

use crate::error::{Error, Result};
use crate::field::Field;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A named scalar with an inclusive valid range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f32, min: f32, max: f32) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid("parameter name must not be empty"));
        }
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(Error::invalid(format!(
                "parameter '{name}' has invalid range [{min}, {max}]"
            )));
        }
        let param = Self {
            name,
            value: min,
            min,
            max,
        };
        param.check(value)?;
        Ok(Self { value, ..param })
    }

    fn check(&self, value: f32) -> Result<()> {
        if value.is_finite() && (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "parameter '{}' must be within [{}, {}], got {value}",
                self.name, self.min, self.max
            )))
        }
    }
}

/// A set of uniquely named parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameters {
    params: BTreeMap<String, Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; names must be unique
    pub fn with(mut self, name: &str, value: f32, min: f32, max: f32) -> Result<Self> {
        if self.params.contains_key(name) {
            return Err(Error::invalid(format!("duplicate parameter '{name}'")));
        }
        let param = Parameter::new(name, value, min, max)?;
        self.params.insert(param.name.clone(), param);
        Ok(self)
    }

    /// Current value of `name`
    pub fn get(&self, name: &str) -> Result<f32> {
        self.parameter(name).map(|p| p.value)
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.params
            .get(name)
            .ok_or_else(|| Error::invalid(format!("unknown parameter '{name}'")))
    }

    /// Set `name` to `value`, returning whether the value changed
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn set(&mut self, name: &str, value: f32) -> Result<bool> {
        let param = self
            .params
            .get_mut(name)
            .ok_or_else(|| Error::invalid(format!("unknown parameter '{name}'")))?;
        param.check(value)?;
        let changed = param.value != value;
        param.value = value;
        Ok(changed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

type BuildFn = Box<dyn Fn(&Parameters) -> Result<Field> + Send + Sync>;

/// A field rebuilt lazily from its parameters
pub struct ParametricModel {
    params: Parameters,
    build: BuildFn,
    revision: u64,
    cached: Option<(u64, Field)>,
    builds: u64,
}

impl ParametricModel {
    pub fn new<F>(params: Parameters, build: F) -> Self
    where
        F: Fn(&Parameters) -> Result<Field> + Send + Sync + 'static,
    {
        Self {
            params,
            build: Box::new(build),
            revision: 0,
            cached: None,
            builds: 0,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Change a parameter; the field is rebuilt on the next [`Self::field`]
    pub fn set(&mut self, name: &str, value: f32) -> Result<()> {
        if self.params.set(name, value)? {
            self.revision += 1;
            tracing::debug!(name, value, revision = self.revision, "parameter changed");
        }
        Ok(())
    }

    /// Revision of the parameter values
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of times the build function has run
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// The field for the current parameter values
    ///
    /// A failed build leaves the previous cache in place and is retried on
    /// the next call.
    pub fn field(&mut self) -> Result<Field> {
        if let Some((revision, field)) = &self.cached {
            if *revision == self.revision {
                return Ok(field.clone());
            }
        }
        let field = (self.build)(&self.params)?;
        self.builds += 1;
        self.cached = Some((self.revision, field.clone()));
        Ok(field)
    }
}

impl fmt::Debug for ParametricModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametricModel")
            .field("params", &self.params)
            .field("revision", &self.revision)
            .field("builds", &self.builds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::primitives::sphere;
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn radius_model() -> ParametricModel {
        let params = Parameters::new().with("radius", 2.0, 0.5, 10.0).unwrap();
        ParametricModel::new(params, |p| sphere(Vec3::ZERO, p.get("radius")?))
    }

    #[test]
    fn parameter_must_start_in_range() {
        assert!(Parameter::new("r", 11.0, 0.0, 10.0).is_err());
        assert!(Parameter::new("r", 1.0, 5.0, 0.0).is_err());
        assert!(Parameter::new("", 1.0, 0.0, 2.0).is_err());
        assert!(Parameter::new("r", 1.0, 0.0, 2.0).is_ok());
    }

    #[test]
    fn set_rejects_out_of_range_and_unknown() {
        let mut params = Parameters::new().with("r", 1.0, 0.0, 2.0).unwrap();
        assert!(params.set("r", 3.0).is_err());
        assert_relative_eq!(params.get("r").unwrap(), 1.0);
        assert!(params.set("missing", 1.0).is_err());
        assert!(params.set("r", f32::NAN).is_err());
        assert!(Parameters::new().with("r", 1.0, 0.0, 2.0).unwrap().with("r", 1.0, 0.0, 2.0).is_err());
    }

    #[test]
    fn field_rebuilds_only_after_change() {
        let mut model = radius_model();
        let first = model.field().unwrap();
        let again = model.field().unwrap();
        assert_eq!(model.builds(), 1);
        assert_eq!(first.evaluate(Vec3::ZERO), again.evaluate(Vec3::ZERO));

        // Setting the same value is not a change
        model.set("radius", 2.0).unwrap();
        model.field().unwrap();
        assert_eq!(model.builds(), 1);

        model.set("radius", 4.0).unwrap();
        assert_eq!(model.revision(), 1);
        let rebuilt = model.field().unwrap();
        assert_eq!(model.builds(), 2);
        assert_relative_eq!(rebuilt.evaluate(Vec3::ZERO), -4.0);
    }

    #[test]
    fn failed_build_is_retried() {
        let params = Parameters::new().with("radius", 1.0, 0.0, 5.0).unwrap();
        let mut model = ParametricModel::new(params, |p| sphere(Vec3::ZERO, p.get("radius")?));
        model.set("radius", 0.0).unwrap();
        assert!(model.field().is_err());
        model.set("radius", 3.0).unwrap();
        assert_relative_eq!(model.field().unwrap().evaluate(Vec3::ZERO), -3.0);
    }
}
