use eyre::WrapErr;
use serde_json::{json, Value};

/// A single CloudFormation resource with its logical name
#[derive(Clone, Debug)]
pub struct CfnResource {
    pub name: String,
    pub resource: Value,
}

impl CfnResource {
    pub fn new(name: &str, resource: Value) -> Self {
        CfnResource {
            name: name.to_string(),
            resource,
        }
    }
}

/// A CloudFormation template under construction
///
/// Synthesis is a plain in-memory graph build, nothing is sent anywhere.
/// Provisioning of the finished template lives in the CLI crate.
#[derive(Clone, Debug)]
pub struct Template {
    stack_name: String,
    template: Value,
}

impl Template {
    pub fn new(stack_name: &str, description: &str) -> Self {
        Template {
            stack_name: stack_name.to_string(),
            template: json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Description": description,
                "Resources": {},
                "Outputs": {}
            }),
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Add a resource to the CFN template
    pub fn add_resource(&mut self, CfnResource { name, resource }: CfnResource) {
        self.template
            .get_mut("Resources")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .insert(name, resource);
    }

    pub fn add_resources(&mut self, resources: Vec<CfnResource>) {
        for resource in resources {
            self.add_resource(resource);
        }
    }

    /// Declare a stack output, optionally exported for cross-stack imports
    pub fn add_output(&mut self, name: &str, value: Value, export: Option<&str>) {
        let mut output = json!({ "Value": value });

        if let Some(export) = export {
            output
                .as_object_mut()
                .unwrap()
                .insert("Export".into(), json!({ "Name": export }));
        }

        self.template
            .get_mut("Outputs")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .insert(name.to_string(), output);
    }

    pub fn body(&self) -> &Value {
        &self.template
    }

    pub fn to_json_pretty(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(&self.template).wrap_err("Failed to serialize template")
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template.clone())
    }
}

/// Reference an exported value of another stack
pub fn import(export_name: &str) -> Value {
    json!({ "Fn::ImportValue": export_name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_carry_export_names() {
        let mut template = Template::new("some-stack", "test");
        template.add_output("VpcId", json!({ "Ref": "Vpc" }), Some("some-stack:VpcId"));
        template.add_output("Internal", json!("plain"), None);

        let outputs = template.body().get("Outputs").unwrap();
        assert_eq!(
            outputs["VpcId"]["Export"]["Name"],
            json!("some-stack:VpcId")
        );
        assert!(outputs["Internal"].get("Export").is_none());
    }

    #[test]
    fn resources_land_under_their_logical_name() {
        let mut template = Template::new("some-stack", "test");
        template.add_resource(CfnResource::new(
            "Vpc",
            json!({ "Type": "AWS::EC2::VPC" }),
        ));

        assert_eq!(
            template.body()["Resources"]["Vpc"]["Type"],
            json!("AWS::EC2::VPC")
        );
    }
}
