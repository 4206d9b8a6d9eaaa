use crate::context::{Context, Topology};
use crate::template::CfnResource;
use serde_json::{json, Value};

/// Cluster, log groups, task definitions, the two tagging services and the
/// autoscaling configuration of the primary service
pub(crate) fn resources(context: &Context) -> Vec<CfnResource> {
    let mut resources = vec![
        CfnResource::new(
            "Cluster",
            json!({
                "Type": "AWS::ECS::Cluster",
                "Properties": { "ClusterName": "tagside-cluster" }
            }),
        ),
        log_group("PrimaryServiceLogGroup", "tagside-primary-service"),
        log_group("PreviewServiceLogGroup", "tagside-preview-service"),
        CfnResource::new(
            "TaskExecutionRole",
            json!({
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "AssumeRolePolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Principal": { "Service": ["ecs-tasks.amazonaws.com"] },
                            "Action": ["sts:AssumeRole"]
                        }]
                    },
                    "ManagedPolicyArns": [
                        "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy"
                    ]
                }
            }),
        ),
        CfnResource::new(
            "AlbSecurityGroup",
            json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": "HTTPS from anywhere to the tagging load balancer",
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
        CfnResource::new(
            "ServiceSecurityGroup",
            json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": "Inbound traffic from the load balancer to the tagging services",
                    "VpcId": { "Ref": "Vpc" },
                    "SecurityGroupIngress": [{
                        "IpProtocol": "tcp",
                        "FromPort": 80,
                        "ToPort": 80,
                        "SourceSecurityGroupId": { "Ref": "AlbSecurityGroup" }
                    }]
                }
            }),
        ),
        task_definition(
            "PrimaryTaskDefinition",
            "tagside-primary",
            "primary",
            "PrimaryServiceLogGroup",
            context,
            json!([
                { "Name": "PORT", "Value": "80" },
                { "Name": "CONTAINER_CONFIG", "Value": context.container_config },
                { "Name": "PREVIEW_SERVER_URL", "Value": format!("https://{}", context.preview_dns) },
                { "Name": "CONTAINER_REFRESH_SECONDS", "Value": "86400" }
            ]),
        ),
        task_definition(
            "PreviewTaskDefinition",
            "tagside-preview",
            "preview",
            "PreviewServiceLogGroup",
            context,
            json!([
                { "Name": "PORT", "Value": "80" },
                { "Name": "CONTAINER_CONFIG", "Value": context.container_config },
                { "Name": "RUN_AS_PREVIEW_SERVER", "Value": "true" },
                { "Name": "CONTAINER_REFRESH_SECONDS", "Value": "86400" }
            ]),
        ),
    ];

    resources.push(service(
        "PrimaryService",
        "tagside-primary",
        "PrimaryTaskDefinition",
        3,
        // The rule is the last routing piece the target group attachment waits on
        Some(("primary", "PrimaryTargetGroup", "PrimaryHostRule")),
    ));

    resources.push(match context.topology {
        Topology::SingleLb => service(
            "PreviewService",
            "tagside-preview",
            "PreviewTaskDefinition",
            1,
            Some(("preview", "PreviewTargetGroup", "HttpsListener")),
        ),

        // Without a load balancer of its own the preview service is reached
        // through the private zone only
        Topology::DualLb => service(
            "PreviewService",
            "tagside-preview",
            "PreviewTaskDefinition",
            1,
            None,
        ),
    });

    resources.extend(autoscaling());
    resources
}

fn log_group(name: &str, log_group_name: &str) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::Logs::LogGroup",
            "DeletionPolicy": "Delete",
            "Properties": {
                "LogGroupName": log_group_name,
                "RetentionInDays": 30
            }
        }),
    )
}

/// Fargate task definition running the tagging container image
fn task_definition(
    name: &str,
    family: &str,
    container_name: &str,
    log_group: &str,
    context: &Context,
    environment: Value,
) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::ECS::TaskDefinition",
            "Properties": {
                "Family": family,
                "RequiresCompatibilities": ["FARGATE"],
                "NetworkMode": "awsvpc",
                "Cpu": "512",
                "Memory": "1024",
                "ExecutionRoleArn": { "Fn::GetAtt": ["TaskExecutionRole", "Arn"] },
                "ContainerDefinitions": [{
                    "Name": container_name,
                    "Image": context.tagging_image,
                    "PortMappings": [{ "ContainerPort": 80 }],
                    "Environment": environment,
                    "LogConfiguration": {
                        "LogDriver": "awslogs",
                        "Options": {
                            "awslogs-group": { "Ref": log_group },
                            "awslogs-region": { "Ref": "AWS::Region" },
                            "awslogs-stream-prefix": "tagside"
                        }
                    }
                }]
            }
        }),
    )
}

fn service(
    name: &str,
    service_name: &str,
    task_definition: &str,
    desired_count: u32,
    target: Option<(&str, &str, &str)>,
) -> CfnResource {
    let mut resource = json!({
        "Type": "AWS::ECS::Service",
        "Properties": {
            "ServiceName": service_name,
            "Cluster": { "Ref": "Cluster" },
            "LaunchType": "FARGATE",
            "DesiredCount": desired_count,
            "TaskDefinition": { "Ref": task_definition },
            "NetworkConfiguration": {
                "AwsvpcConfiguration": {
                    "Subnets": [
                        { "Ref": "PrivateSubnetA" },
                        { "Ref": "PrivateSubnetB" }
                    ],
                    "SecurityGroups": [{ "Ref": "ServiceSecurityGroup" }],
                    "AssignPublicIp": "DISABLED"
                }
            }
        }
    });

    if let Some((container, target_group, depends_on)) = target {
        let properties = resource.get_mut("Properties").unwrap();
        properties.as_object_mut().unwrap().insert(
            "LoadBalancers".into(),
            json!([{
                "ContainerName": container,
                "ContainerPort": 80,
                "TargetGroupArn": { "Ref": target_group }
            }]),
        );

        resource
            .as_object_mut()
            .unwrap()
            .insert("DependsOn".into(), json!([depends_on]));
    }

    CfnResource::new(name, resource)
}

/// Target tracking on CPU and memory for the primary service, 2 to 10 tasks
fn autoscaling() -> Vec<CfnResource> {
    vec![
        CfnResource::new(
            "PrimaryScalableTarget",
            json!({
                "Type": "AWS::ApplicationAutoScaling::ScalableTarget",
                "Properties": {
                    "MinCapacity": 2,
                    "MaxCapacity": 10,
                    "ResourceId": { "Fn::Sub": "service/${Cluster}/${PrimaryService.Name}" },
                    "ScalableDimension": "ecs:service:DesiredCount",
                    "ServiceNamespace": "ecs",
                    "RoleARN": {
                        "Fn::Sub": "arn:aws:iam::${AWS::AccountId}:role/aws-service-role/ecs.application-autoscaling.amazonaws.com/AWSServiceRoleForApplicationAutoScaling_ECSService"
                    }
                }
            }),
        ),
        scaling_policy("PrimaryCpuScaling", "ECSServiceAverageCPUUtilization"),
        scaling_policy("PrimaryMemoryScaling", "ECSServiceAverageMemoryUtilization"),
    ]
}

fn scaling_policy(name: &str, metric: &str) -> CfnResource {
    CfnResource::new(
        name,
        json!({
            "Type": "AWS::ApplicationAutoScaling::ScalingPolicy",
            "Properties": {
                "PolicyName": name,
                "PolicyType": "TargetTrackingScaling",
                "ScalingTargetId": { "Ref": "PrimaryScalableTarget" },
                "TargetTrackingScalingPolicyConfiguration": {
                    "PredefinedMetricSpecification": { "PredefinedMetricType": metric },
                    "TargetValue": 50.0
                }
            }
        }),
    )
}
