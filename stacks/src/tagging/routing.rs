use crate::context::{Context, Topology};
use crate::template::CfnResource;
use serde_json::json;

/// Logical name of the load balancer the preview CNAME points to
pub(crate) fn primary_load_balancer(context: &Context) -> &'static str {
    match context.topology {
        Topology::SingleLb => "LoadBalancer",
        Topology::DualLb => "PrimaryLoadBalancer",
    }
}

/// Load balancers, listeners, target groups and the private hosted zone
///
/// Single-lb keeps the preview target group as the listener default so the
/// host-header rule for the primary hostname is the only rule evaluated on
/// the bulk of the traffic. Dual-lb gives the producer side its own load
/// balancer and exports its listener for the analytics stack.
pub(crate) fn resources(context: &Context) -> eyre::Result<Vec<CfnResource>> {
    let mut resources = match context.topology {
        Topology::SingleLb => vec![
            load_balancer("LoadBalancer", "tagside-alb", "AlbSecurityGroup"),
            target_group("PrimaryTargetGroup", "/healthz"),
            target_group("PreviewTargetGroup", "/healthz"),
            listener(
                "HttpsListener",
                "LoadBalancer",
                context,
                json!([{ "Type": "forward", "TargetGroupArn": { "Ref": "PreviewTargetGroup" } }]),
            ),
            host_rule(
                "PrimaryHostRule",
                "HttpsListener",
                1,
                &context.primary_dns,
                "PrimaryTargetGroup",
            ),
        ],

        Topology::DualLb => vec![
            load_balancer("PrimaryLoadBalancer", "tagside-primary-alb", "AlbSecurityGroup"),
            target_group("PrimaryTargetGroup", "/healthz"),
            listener(
                "PrimaryHttpsListener",
                "PrimaryLoadBalancer",
                context,
                json!([{ "Type": "forward", "TargetGroupArn": { "Ref": "PrimaryTargetGroup" } }]),
            ),
            host_rule(
                "PrimaryHostRule",
                "PrimaryHttpsListener",
                1,
                &context.primary_dns,
                "PrimaryTargetGroup",
            ),
            CfnResource::new(
                "ProducerAlbSecurityGroup",
                json!({
                    "Type": "AWS::EC2::SecurityGroup",
                    "Properties": {
                        "GroupDescription": "HTTPS from anywhere to the producer load balancer",
                        "VpcId": { "Ref": "Vpc" },
                        "SecurityGroupIngress": [{
                            "IpProtocol": "tcp",
                            "FromPort": 443,
                            "ToPort": 443,
                            "CidrIp": "0.0.0.0/0"
                        }]
                    }
                }),
            ),
            load_balancer(
                "ProducerLoadBalancer",
                "tagside-producer-alb",
                "ProducerAlbSecurityGroup",
            ),
            // The analytics stack attaches the producer target group and its
            // host rule to this listener through the exported ARN
            listener(
                "ProducerHttpsListener",
                "ProducerLoadBalancer",
                context,
                json!([{
                    "Type": "fixed-response",
                    "FixedResponseConfig": { "StatusCode": "404" }
                }]),
            ),
        ],
    };

    resources.extend([
        CfnResource::new(
            "HostedZone",
            json!({
                "Type": "AWS::Route53::HostedZone",
                "Properties": {
                    "Name": context.root_dns,
                    "VPCs": [{
                        "VPCId": { "Ref": "Vpc" },
                        "VPCRegion": { "Ref": "AWS::Region" }
                    }]
                }
            }),
        ),
        CfnResource::new(
            "PreviewDnsRecord",
            json!({
                "Type": "AWS::Route53::RecordSet",
                "Properties": {
                    "HostedZoneId": { "Ref": "HostedZone" },
                    "Name": context.preview_dns,
                    "Type": "CNAME",
                    "TTL": "300",
                    "ResourceRecords": [
                        { "Fn::GetAtt": [primary_load_balancer(context), "DNSName"] }
                    ]
                }
            }),
        ),
    ]);

    Ok(resources)
}

fn load_balancer(name: &str, lb_name: &str, security_group: &str) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::ElasticLoadBalancingV2::LoadBalancer",
            "Properties": {
                "Name": lb_name,
                "Type": "application",
                "Scheme": "internet-facing",
                "Subnets": [
                    { "Ref": "PublicSubnetA" },
                    { "Ref": "PublicSubnetB" }
                ],
                "SecurityGroups": [{ "Ref": security_group }]
            }
        }),
    )
}

fn target_group(name: &str, health_check_path: &str) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::ElasticLoadBalancingV2::TargetGroup",
            "Properties": {
                "VpcId": { "Ref": "Vpc" },
                "Port": 80,
                "Protocol": "HTTP",
                "TargetType": "ip",
                "HealthCheckPath": health_check_path,
                "HealthCheckProtocol": "HTTP"
            }
        }),
    )
}

fn listener(
    name: &str,
    load_balancer: &str,
    context: &Context,
    default_actions: serde_json::Value,
) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::ElasticLoadBalancingV2::Listener",
            "Properties": {
                "LoadBalancerArn": { "Ref": load_balancer },
                "Port": 443,
                "Protocol": "HTTPS",
                "Certificates": [{ "CertificateArn": context.ssl_cert_arn }],
                "DefaultActions": default_actions
            }
        }),
    )
}

fn host_rule(
    name: &str,
    listener: &str,
    priority: u32,
    host: &str,
    target_group: &str,
) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::ElasticLoadBalancingV2::ListenerRule",
            "Properties": {
                "ListenerArn": { "Ref": listener },
                "Priority": priority,
                "Conditions": [{
                    "Field": "host-header",
                    "HostHeaderConfig": { "Values": [host] }
                }],
                "Actions": [{
                    "Type": "forward",
                    "TargetGroupArn": { "Ref": target_group }
                }]
            }
        }),
    )
}
