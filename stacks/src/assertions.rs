//! Topology assertions over synthesized templates
//!
//! Test-facing queries in the manner of CloudFormation template assertions:
//! count resources by type, fetch one by logical name, match properties.

use crate::template::Template;
use serde_json::{Map, Value};

/// The `Resources` map of a synthesized template
pub fn resources(template: &Template) -> &Map<String, Value> {
    template
        .body()
        .get("Resources")
        .and_then(|r| r.as_object())
        .expect("Template has no Resources map")
}

/// All resources of the given CloudFormation type, with their logical names
pub fn resources_of_type<'a>(template: &'a Template, ty: &str) -> Vec<(&'a str, &'a Value)> {
    resources(template)
        .iter()
        .filter(|(_, resource)| resource.get("Type").and_then(|t| t.as_str()) == Some(ty))
        .map(|(name, resource)| (name.as_str(), resource))
        .collect()
}

pub fn count_resources(template: &Template, ty: &str) -> usize {
    resources_of_type(template, ty).len()
}

/// Properties of the resource with the given logical name
pub fn properties<'a>(template: &'a Template, logical_name: &str) -> &'a Value {
    resources(template)
        .get(logical_name)
        .and_then(|r| r.get("Properties"))
        .unwrap_or_else(|| panic!("No resource {logical_name} with properties"))
}

/// Whether some resource of the given type satisfies the predicate on its
/// properties
pub fn any_resource_has(template: &Template, ty: &str, predicate: impl Fn(&Value) -> bool) -> bool {
    resources_of_type(template, ty)
        .iter()
        .filter_map(|(_, resource)| resource.get("Properties"))
        .any(|properties| predicate(properties))
}

/// The export name declared by the given output, if any
pub fn export_name<'a>(template: &'a Template, output: &str) -> Option<&'a str> {
    template
        .body()
        .get("Outputs")?
        .get(output)?
        .get("Export")?
        .get("Name")?
        .as_str()
}
