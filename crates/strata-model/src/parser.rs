//! Building configuration models from settings text
//!
//! [`ConfigurationModelParser`] keeps the raw object of the last parse so
//! the model can be rebuilt with new [`ParseOptions`] without tokenizing
//! the text again.

use serde_json::{Map, Value};

use strata_registry::ConfigurationRegistry;
use strata_tree::ValueTree;

use crate::model::{ConfigurationModel, RawSource};
use crate::parse_options::ParseOptions;
use crate::raw_parser::RawParser;
use crate::visitor::{JsonVisitor, ParseError, visit};

/// Parses one named settings source into a [`ConfigurationModel`].
///
/// # Examples
///
/// ```
/// use strata_model::{ConfigurationModelParser, ParseOptions};
/// use strata_registry::ConfigurationRegistry;
/// use serde_json::json;
///
/// let registry = ConfigurationRegistry::new();
/// let mut parser = ConfigurationModelParser::new("settings.json");
/// parser.parse(r#"{ "editor.fontSize": 12, }"#, &ParseOptions::default(), &registry);
///
/// let model = parser.configuration_model();
/// assert_eq!(model.get_value(Some("editor.fontSize")), Some(json!(12)));
/// assert!(parser.errors().is_empty());
/// ```
#[derive(Debug)]
pub struct ConfigurationModelParser {
    name: String,
    raw: Option<ValueTree>,
    model: ConfigurationModel,
    restricted: Vec<String>,
    errors: Vec<ParseError>,
}

impl ConfigurationModelParser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: None,
            model: ConfigurationModel::empty(),
            restricted: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model from the last parse, or an empty model.
    pub fn configuration_model(&self) -> &ConfigurationModel {
        &self.model
    }

    pub fn into_configuration_model(self) -> ConfigurationModel {
        self.model
    }

    /// Restricted properties met during the last parse.
    pub fn restricted_configurations(&self) -> &[String] {
        &self.restricted
    }

    /// Syntax errors from the last call to [`parse`](Self::parse).
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Tokenize `content` and build the model from it.
    ///
    /// Syntax errors are recorded and logged; the model is then built from
    /// an empty object. Empty content is an empty object without errors.
    pub fn parse(&mut self, content: &str, options: &ParseOptions, registry: &ConfigurationRegistry) {
        let raw = self.parse_content(content);
        self.parse_raw(raw, options, registry);
    }

    /// Build the model from an already parsed object.
    pub fn parse_raw(&mut self, raw: ValueTree, options: &ParseOptions, registry: &ConfigurationRegistry) {
        let name = &self.name;
        let result = RawParser::new(registry, options).parse(&raw, |conflict| {
            tracing::error!("Conflict in settings file {}: {}", name, conflict)
        });

        let retained = result
            .has_excluded_properties
            .then(|| vec![RawSource::Object(raw.clone())]);
        self.model = ConfigurationModel::new(result.contents, result.keys, result.overrides, retained);
        self.restricted = result.restricted;
        self.raw = Some(raw);
    }

    /// Rebuild the model from the last raw object with new options.
    ///
    /// Does nothing if nothing was parsed yet.
    pub fn reparse(&mut self, options: &ParseOptions, registry: &ConfigurationRegistry) {
        if let Some(raw) = self.raw.take() {
            self.parse_raw(raw, options, registry);
        }
    }

    fn parse_content(&mut self, content: &str) -> ValueTree {
        self.errors.clear();
        if content.is_empty() {
            return ValueTree::new();
        }

        let mut builder = ContentBuilder::default();
        visit(content, &mut builder);
        for error in &builder.errors {
            tracing::error!("Error while parsing settings file {}: {}", self.name, error);
        }
        self.errors = builder.errors;

        match builder.root {
            Some(Value::Object(raw)) => raw,
            _ => ValueTree::new(),
        }
    }
}

/// Rebuilds a value from visitor events, keeping the first root value.
#[derive(Default)]
struct ContentBuilder {
    root: Option<Value>,
    parents: Vec<(Value, Option<String>)>,
    errors: Vec<ParseError>,
}

impl ContentBuilder {
    fn on_value(&mut self, value: Value) {
        match self.parents.last_mut() {
            Some((Value::Array(items), _)) => items.push(value),
            Some((Value::Object(object), property)) => {
                if let Some(property) = property.take() {
                    object.insert(property, value);
                }
            }
            Some(_) => {}
            None => {
                if self.root.is_none() {
                    self.root = Some(value);
                }
            }
        }
    }

    fn close(&mut self) {
        if let Some((value, _)) = self.parents.pop() {
            self.on_value(value);
        }
    }
}

impl JsonVisitor for ContentBuilder {
    fn on_object_begin(&mut self) {
        self.parents.push((Value::Object(Map::new()), None));
    }

    fn on_object_property(&mut self, name: &str) {
        if let Some((_, property)) = self.parents.last_mut() {
            *property = Some(name.to_string());
        }
    }

    fn on_object_end(&mut self) {
        self.close();
    }

    fn on_array_begin(&mut self) {
        self.parents.push((Value::Array(Vec::new()), None));
    }

    fn on_array_end(&mut self) {
        self.close();
    }

    fn on_literal_value(&mut self, value: Value) {
        self.on_value(value);
    }

    fn on_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}
