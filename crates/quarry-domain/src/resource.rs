//! Resource module - the metadata graph produced for one logical entity

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property holding a resource's type tags
pub const RDF_TYPE: &str = "rdf:type";

/// Prefix of generated blank-node identifiers
const BLANK_PREFIX: &str = "_:";

/// A single property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Reference to another resource or vocabulary term by identifier
    Uri(String),
    /// Literal string
    String(String),
    /// Literal integer
    Int(i64),
    /// Literal floating point number
    Double(f64),
    /// Literal boolean
    Bool(bool),
    /// ISO-8601 date/time literal
    DateTime(String),
    /// Nested resource (a relation to another entity)
    Resource(Box<Resource>),
}

impl PropertyValue {
    /// Get the value as a string slice when it is textual (string, URI or date)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Uri(s) | PropertyValue::String(s) | PropertyValue::DateTime(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Get the value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the nested resource, if this value is a relation
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            PropertyValue::Resource(r) => Some(r),
            _ => None,
        }
    }
}

/// Metadata about one logical entity
///
/// A resource has an identifier (usually a content id or a derived content
/// id) and a multimap of properties. Types are stored as [`RDF_TYPE`] URI
/// values. Relations to other entities are nested resources, so a single
/// root can carry a whole forest (a file and the emails stored in it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    identifier: String,
    #[serde(default)]
    properties: BTreeMap<String, Vec<PropertyValue>>,
}

impl Resource {
    /// Create a resource with the given identifier
    ///
    /// An empty identifier produces a blank node (see [`Resource::new_blank`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_domain::Resource;
    ///
    /// let mut track = Resource::new("h:deadbeef");
    /// track.add_type("nmm:MusicPiece");
    /// track.set_string("nie:title", "Intro");
    /// assert!(track.has_type("nmm:MusicPiece"));
    /// ```
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Self::new_blank();
        }
        Self {
            identifier,
            properties: BTreeMap::new(),
        }
    }

    /// Create a resource with a generated blank-node identifier
    pub fn new_blank() -> Self {
        Self {
            identifier: format!("{}{}", BLANK_PREFIX, uuid::Uuid::now_v7().simple()),
            properties: BTreeMap::new(),
        }
    }

    /// Get the identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Check if the identifier was generated
    pub fn is_blank(&self) -> bool {
        self.identifier.starts_with(BLANK_PREFIX)
    }

    /// Add a type tag
    pub fn add_type(&mut self, type_uri: impl Into<String>) {
        let type_uri = type_uri.into();
        if !self.has_type(&type_uri) {
            self.add_value(RDF_TYPE, PropertyValue::Uri(type_uri));
        }
    }

    /// All type tags, in insertion order
    pub fn types(&self) -> Vec<&str> {
        self.values(RDF_TYPE)
            .iter()
            .filter_map(PropertyValue::as_str)
            .collect()
    }

    /// Check for a type tag
    pub fn has_type(&self, type_uri: &str) -> bool {
        self.values(RDF_TYPE)
            .iter()
            .any(|v| v.as_str() == Some(type_uri))
    }

    /// Replace all values of a property with one value
    pub fn set_value(&mut self, property: impl Into<String>, value: PropertyValue) {
        self.properties.insert(property.into(), vec![value]);
    }

    /// Append a value to a property
    pub fn add_value(&mut self, property: impl Into<String>, value: PropertyValue) {
        self.properties.entry(property.into()).or_default().push(value);
    }

    /// Set a string property
    pub fn set_string(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.set_value(property, PropertyValue::String(value.into()));
    }

    /// Append a string value
    pub fn add_string(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.add_value(property, PropertyValue::String(value.into()));
    }

    /// Set a URI property
    pub fn set_uri(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.set_value(property, PropertyValue::Uri(value.into()));
    }

    /// Append a URI value
    pub fn add_uri(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.add_value(property, PropertyValue::Uri(value.into()));
    }

    /// Set an integer property
    pub fn set_int(&mut self, property: impl Into<String>, value: i64) {
        self.set_value(property, PropertyValue::Int(value));
    }

    /// Set a floating point property
    pub fn set_double(&mut self, property: impl Into<String>, value: f64) {
        self.set_value(property, PropertyValue::Double(value));
    }

    /// Set a boolean property
    pub fn set_bool(&mut self, property: impl Into<String>, value: bool) {
        self.set_value(property, PropertyValue::Bool(value));
    }

    /// Set a date/time property (ISO-8601)
    pub fn set_datetime(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.set_value(property, PropertyValue::DateTime(value.into()));
    }

    /// Relate this resource to exactly one other resource through `property`
    pub fn set_relation(&mut self, property: impl Into<String>, related: Resource) {
        self.set_value(property, PropertyValue::Resource(Box::new(related)));
    }

    /// Add a related resource through `property`
    pub fn add_relation(&mut self, property: impl Into<String>, related: Resource) {
        self.add_value(property, PropertyValue::Resource(Box::new(related)));
    }

    /// Remove all values of a property
    pub fn remove(&mut self, property: &str) -> Option<Vec<PropertyValue>> {
        self.properties.remove(property)
    }

    /// All values of a property (empty if unset)
    pub fn values(&self, property: &str) -> &[PropertyValue] {
        self.properties
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First value of a property
    pub fn first(&self, property: &str) -> Option<&PropertyValue> {
        self.values(property).first()
    }

    /// First value of a property as a string
    pub fn first_string(&self, property: &str) -> Option<&str> {
        self.first(property).and_then(PropertyValue::as_str)
    }

    /// Iterate over `(property, values)` pairs in property order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &[PropertyValue])> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct properties set
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Directly nested resources
    pub fn related(&self) -> impl Iterator<Item = &Resource> {
        self.properties
            .values()
            .flatten()
            .filter_map(PropertyValue::as_resource)
    }

    /// Flatten the graph rooted at this resource
    ///
    /// Returns this resource followed by every nested resource (depth-first),
    /// each with nested values replaced by [`PropertyValue::Uri`] references
    /// to the child's identifier. This is the row shape the store persists.
    pub fn flatten(&self) -> Vec<Resource> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<Resource>) {
        let mut flat = Resource {
            identifier: self.identifier.clone(),
            properties: BTreeMap::new(),
        };
        let mut children = Vec::new();

        for (property, values) in &self.properties {
            let flat_values = values
                .iter()
                .map(|value| match value {
                    PropertyValue::Resource(child) => {
                        children.push(child.as_ref());
                        PropertyValue::Uri(child.identifier.clone())
                    }
                    other => other.clone(),
                })
                .collect();
            flat.properties.insert(property.clone(), flat_values);
        }

        out.push(flat);
        for child in children {
            child.flatten_into(out);
        }
    }
}
