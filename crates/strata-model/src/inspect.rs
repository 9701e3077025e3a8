//! Per-model inspection
//!
//! Answers "what does this layer say about this section" with every value
//! computed on first access.

use serde::Serialize;
use serde_json::Value;
use std::cell::OnceCell;

use strata_tree::get_value;

use crate::model::ConfigurationModel;

/// The value of a section inside one override bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideValue {
    pub identifiers: Vec<String>,
    pub value: Value,
}

/// A fully computed inspection of one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<OverrideValue>>,
}

impl InspectValue {
    /// Whether the layer defines the section at all.
    pub fn is_defined(&self) -> bool {
        self.value.is_some() || self.override_value.is_some() || self.overrides.is_some()
    }
}

/// Lazy inspection of a section in an unfiltered model.
pub struct ModelInspection<'a> {
    model: &'a ConfigurationModel,
    section: String,
    identifier: Option<String>,
    value: OnceCell<Option<Value>>,
    override_value: OnceCell<Option<Value>>,
    merged: OnceCell<Option<Value>>,
    overrides: OnceCell<Option<Vec<OverrideValue>>>,
}

impl<'a> ModelInspection<'a> {
    pub(crate) fn new(model: &'a ConfigurationModel, section: &str, identifier: Option<&str>) -> Self {
        Self {
            model,
            section: section.to_string(),
            identifier: identifier.map(str::to_string),
            value: OnceCell::new(),
            override_value: OnceCell::new(),
            merged: OnceCell::new(),
            overrides: OnceCell::new(),
        }
    }

    /// The section's base value.
    pub fn value(&self) -> Option<&Value> {
        self.value
            .get_or_init(|| self.model.get_value(Some(&self.section)))
            .as_ref()
    }

    /// The section's value for the inspected identifier alone.
    pub fn override_value(&self) -> Option<&Value> {
        self.override_value
            .get_or_init(|| {
                let identifier = self.identifier.as_deref()?;
                self.model.get_override_value(Some(&self.section), identifier)
            })
            .as_ref()
    }

    /// The effective value with the identifier's overrides applied.
    pub fn merged(&self) -> Option<&Value> {
        self.merged
            .get_or_init(|| match self.identifier.as_deref() {
                Some(identifier) => self
                    .model
                    .override_model(identifier)
                    .get_value(Some(&self.section)),
                None => self.model.get_value(Some(&self.section)),
            })
            .as_ref()
    }

    /// Every override bucket that defines the section.
    pub fn overrides(&self) -> Option<&[OverrideValue]> {
        self.overrides
            .get_or_init(|| {
                let overrides: Vec<OverrideValue> = self
                    .model
                    .overrides()
                    .iter()
                    .filter_map(|bucket| {
                        get_value(&bucket.contents, &self.section).map(|value| OverrideValue {
                            identifiers: bucket.identifiers.clone(),
                            value: value.clone(),
                        })
                    })
                    .collect();
                (!overrides.is_empty()).then_some(overrides)
            })
            .as_deref()
    }

    /// Compute every field.
    pub fn to_inspect_value(&self) -> InspectValue {
        InspectValue {
            value: self.value().cloned(),
            override_value: self.override_value().cloned(),
            merged: self.merged().cloned(),
            overrides: self.overrides().map(<[OverrideValue]>::to_vec),
        }
    }
}
