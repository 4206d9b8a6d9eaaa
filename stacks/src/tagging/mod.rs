mod network;
mod routing;
mod services;

use crate::context::{Context, Ingestion, Topology};
use crate::template::Template;
use serde_json::json;

pub const STACK_NAME: &str = "tagside-tagging";

/// Typed handles to the tagging stack outputs consumed by the analytics stack
///
/// Each field holds a CloudFormation export name, resolved in the consuming
/// template with `Fn::ImportValue`. This replaces object threading between
/// stack constructs with explicit parameters.
#[derive(Clone, Debug)]
pub struct TaggingOutputs {
    pub vpc_id: String,
    pub private_subnet_ids: [String; 2],
    pub cluster_name: String,

    /// Listener the producer target group and host rule attach to
    pub ingest_listener_arn: String,

    /// Security group of the load balancer fronting the producer service
    pub ingest_alb_security_group_id: String,

    /// Rule priority left free for the producer host rule on that listener
    pub ingest_rule_priority: u32,

    pub hosted_zone_id: String,

    /// Interface endpoint for the private REST API, api-gateway ingestion only
    pub apigw_endpoint_id: Option<String>,
}

/// Tagging-server stack: network, cluster, tagging services and routing
pub struct TaggingStack;

impl TaggingStack {
    /// Synthesize the tagging-server template and its cross-stack handles
    pub fn synth(context: &Context) -> eyre::Result<(Template, TaggingOutputs)> {
        let mut template = Template::new(
            STACK_NAME,
            "Server-side tagging deployment: network, compute cluster and tagging services",
        );

        template.add_resources(network::resources(context));
        template.add_resources(services::resources(context));
        template.add_resources(routing::resources(context)?);

        template.add_output("VpcId", json!({ "Ref": "Vpc" }), Some(&export("VpcId")));
        template.add_output(
            "PrivateSubnetAId",
            json!({ "Ref": "PrivateSubnetA" }),
            Some(&export("PrivateSubnetAId")),
        );
        template.add_output(
            "PrivateSubnetBId",
            json!({ "Ref": "PrivateSubnetB" }),
            Some(&export("PrivateSubnetBId")),
        );
        template.add_output(
            "ClusterName",
            json!({ "Ref": "Cluster" }),
            Some(&export("ClusterName")),
        );
        template.add_output(
            "HostedZoneId",
            json!({ "Ref": "HostedZone" }),
            Some(&export("HostedZoneId")),
        );

        // The producer service lands either behind the shared listener (after
        // the primary host rule) or behind its own load balancer.
        let (listener, alb_security_group, priority) = match context.topology {
            Topology::SingleLb => ("HttpsListener", "AlbSecurityGroup", 2),
            Topology::DualLb => ("ProducerHttpsListener", "ProducerAlbSecurityGroup", 1),
        };

        template.add_output(
            "IngestListenerArn",
            json!({ "Ref": listener }),
            Some(&export("IngestListenerArn")),
        );
        template.add_output(
            "IngestAlbSecurityGroupId",
            json!({ "Ref": alb_security_group }),
            Some(&export("IngestAlbSecurityGroupId")),
        );
        template.add_output(
            "LoadBalancerDnsName",
            json!({ "Fn::GetAtt": [routing::primary_load_balancer(context), "DNSName"] }),
            Some(&export("LoadBalancerDnsName")),
        );

        let apigw_endpoint_id = match context.ingestion {
            Ingestion::ApiGateway => {
                template.add_output(
                    "ApiGatewayEndpointId",
                    json!({ "Ref": "ApiGatewayEndpoint" }),
                    Some(&export("ApiGatewayEndpointId")),
                );

                Some(export("ApiGatewayEndpointId"))
            }
            Ingestion::ProducerService => None,
        };

        let outputs = TaggingOutputs {
            vpc_id: export("VpcId"),
            private_subnet_ids: [export("PrivateSubnetAId"), export("PrivateSubnetBId")],
            cluster_name: export("ClusterName"),
            ingest_listener_arn: export("IngestListenerArn"),
            ingest_alb_security_group_id: export("IngestAlbSecurityGroupId"),
            ingest_rule_priority: priority,
            hosted_zone_id: export("HostedZoneId"),
            apigw_endpoint_id,
        };

        Ok((template, outputs))
    }
}

fn export(name: &str) -> String {
    format!("{STACK_NAME}:{name}")
}
