//! Run-time state of one declared flag.

use crate::error::{Result, ShellError};
use crate::flag::FlagDescriptor;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct FlagOption {
    descriptor: FlagDescriptor,
    enabled: bool,
    values: Vec<Value>,
}

impl FlagOption {
    /// Build an option from a flag spec such as `--address=*`.
    pub fn parse(spec: &str) -> Result<Self> {
        Self::from_descriptor(FlagDescriptor::parse(spec)?)
    }

    /// Initial values are loaded but do not enable the option.
    pub fn from_descriptor(descriptor: FlagDescriptor) -> Result<Self> {
        let initial = descriptor.initial_values.clone();
        let mut opt =
            FlagOption { enabled: descriptor.enabled_by_default, descriptor, values: Vec::new() };
        if opt.can_have_multiple_values() {
            opt.add_values(initial)?;
        } else if let Some(first) = initial.into_iter().next() {
            opt.add_value(first)?;
        }
        Ok(opt)
    }

    pub fn descriptor(&self) -> &FlagDescriptor { &self.descriptor }
    pub fn flag(&self) -> &str { &self.descriptor.flag }
    pub fn description(&self) -> Option<&str> { self.descriptor.description.as_deref() }
    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn is_disabled(&self) -> bool { !self.enabled }
    pub fn can_have_value(&self) -> bool { self.descriptor.can_have_value }
    pub fn can_have_multiple_values(&self) -> bool { self.descriptor.can_have_multiple_values }
    pub fn values(&self) -> &[Value] { &self.values }

    pub fn enable(&mut self, enable: bool) -> &mut Self {
        self.enabled = enable;
        self
    }

    pub fn disable(&mut self) -> &mut Self { self.enable(false) }

    pub fn has_value(&self, value: &Value) -> bool { self.values.contains(value) }

    /// Multi-valued options append unseen values; single-valued options
    /// replace their value.
    pub fn add_value(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        self.assert_can_have_value()?;
        value.validate()?;
        if self.can_have_multiple_values() {
            if !self.has_value(&value) {
                self.values.push(value);
            }
        } else {
            self.values = vec![value];
        }
        Ok(self)
    }

    pub fn add_values<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.assert_can_have_multiple_values()?;
        for v in values {
            self.add_value(v)?;
        }
        Ok(self)
    }

    /// Remove the first value equal to `value`.
    ///
    /// Removing `None` from an option that is not multi-valued clears it and
    /// turns it off.
    pub fn remove_value(&mut self, value: Option<Value>) -> Result<&mut Self> {
        let value = match value {
            None if !self.can_have_multiple_values() => {
                self.values.clear();
                self.enabled = false;
                return Ok(self);
            }
            None => {
                return Err(ShellError::InvalidValue(format!(
                    "the option [{}] needs a value to remove",
                    self.flag()
                )))
            }
            Some(v) => v,
        };
        value.validate()?;
        self.assert_can_have_value()?;
        if let Some(idx) = self.values.iter().position(|v| *v == value) {
            self.values.remove(idx);
        }
        if !self.can_have_multiple_values() && self.values.is_empty() {
            self.enabled = false;
        }
        Ok(self)
    }

    pub fn remove_values<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.assert_can_have_multiple_values()?;
        for v in values {
            self.remove_value(Some(v.into()))?;
        }
        Ok(self)
    }

    /// Argument-vector tokens for this option: nothing when disabled or when
    /// it takes values but has none, `flag value` per value, or the bare flag.
    pub fn tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.is_disabled() || (self.can_have_value() && self.values.is_empty()) {
            return out;
        }
        for v in &self.values {
            out.push(self.flag().to_string());
            out.push(v.to_token());
        }
        if out.is_empty() {
            out.push(self.flag().to_string());
        }
        out
    }

    fn assert_can_have_value(&self) -> Result<()> {
        if !self.can_have_value() {
            return Err(ShellError::InvalidValue(format!(
                "the option [{}] cannot set or remove any values",
                self.flag()
            )));
        }
        Ok(())
    }

    fn assert_can_have_multiple_values(&self) -> Result<()> {
        if !self.can_have_multiple_values() {
            return Err(ShellError::Unsupported(format!(
                "the option [{}] cannot set or remove multiple values",
                self.flag()
            )));
        }
        Ok(())
    }
}
