use crate::context::Context;
use crate::tagging::TaggingOutputs;
use crate::template::{import, CfnResource};
use serde_json::json;

/// Maps the validated request body into a Kinesis PutRecords call
fn put_records_template(stream_name: &str) -> String {
    format!(
        "{{\"StreamName\":\"{stream_name}\",\"Records\":[#foreach($record in $input.path('$.records')){{\"Data\":\"$util.base64Encode($input.json('$.records[$foreach.index].data'))\",\"PartitionKey\":\"$context.requestId\"}}#if($foreach.hasNext),#end#end]}}"
    )
}

/// Private REST API authenticated by a Cognito user pool, integrated
/// directly with the data stream
pub(crate) fn api_gateway(
    context: &Context,
    tagging: &TaggingOutputs,
) -> eyre::Result<Vec<CfnResource>> {
    let endpoint_export = tagging
        .apigw_endpoint_id
        .as_deref()
        .ok_or_else(|| eyre::eyre!("The tagging stack exports no API Gateway VPC endpoint"))?;

    let endpoint = import(endpoint_export);

    Ok(vec![
        CfnResource::new(
            "ApiAccessLogGroup",
            json!({
                "Type": "AWS::Logs::LogGroup",
                "DeletionPolicy": "Delete",
                "Properties": {
                    "LogGroupName": "tagside-api-access",
                    "RetentionInDays": 30
                }
            }),
        ),
        CfnResource::new(
            "ApiExecutionRole",
            json!({
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "AssumeRolePolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Principal": { "Service": ["apigateway.amazonaws.com"] },
                            "Action": ["sts:AssumeRole"]
                        }]
                    },
                    "ManagedPolicyArns": [
                        "arn:aws:iam::aws:policy/AmazonAPIGatewayInvokeFullAccess"
                    ],
                    "Policies": [{
                        "PolicyName": "PutRecordsPolicy",
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Action": ["kinesis:PutRecords"],
                                "Resource": { "Fn::GetAtt": ["Stream", "Arn"] }
                            }]
                        }
                    }]
                }
            }),
        ),
        CfnResource::new(
            "ApiCloudWatchRole",
            json!({
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "AssumeRolePolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Principal": { "Service": ["apigateway.amazonaws.com"] },
                            "Action": ["sts:AssumeRole"]
                        }]
                    },
                    "ManagedPolicyArns": [
                        "arn:aws:iam::aws:policy/service-role/AmazonAPIGatewayPushToCloudWatchLogs"
                    ]
                }
            }),
        ),
        CfnResource::new(
            "ApiGatewayAccount",
            json!({
                "Type": "AWS::ApiGateway::Account",
                "Properties": {
                    "CloudWatchRoleArn": { "Fn::GetAtt": ["ApiCloudWatchRole", "Arn"] }
                }
            }),
        ),
        CfnResource::new(
            "RestApi",
            json!({
                "Type": "AWS::ApiGateway::RestApi",
                "Properties": {
                    "Name": "tagside-ingest",
                    "EndpointConfiguration": {
                        "Types": ["PRIVATE"],
                        "VpcEndpointIds": [endpoint]
                    },
                    // Reachable only through the tagging VPC endpoint
                    "Policy": {
                        "Version": "2012-10-17",
                        "Statement": [
                            {
                                "Effect": "Allow",
                                "Principal": "*",
                                "Action": "execute-api:Invoke",
                                "Resource": "execute-api:/*"
                            },
                            {
                                "Effect": "Deny",
                                "Principal": "*",
                                "Action": "execute-api:Invoke",
                                "Resource": "execute-api:/*",
                                "Condition": {
                                    "StringNotEquals": { "aws:SourceVpce": endpoint }
                                }
                            }
                        ]
                    }
                }
            }),
        ),
        CfnResource::new(
            "UserPool",
            json!({
                "Type": "AWS::Cognito::UserPool",
                "Properties": {
                    "UserPoolName": "tagside-users",
                    "Policies": {
                        "PasswordPolicy": {
                            "MinimumLength": 12,
                            "RequireLowercase": true,
                            "RequireUppercase": true,
                            "RequireNumbers": true,
                            "RequireSymbols": true
                        }
                    },
                    "UserPoolAddOns": { "AdvancedSecurityMode": "ENFORCED" }
                }
            }),
        ),
        CfnResource::new(
            "RequestAuthorizer",
            json!({
                "Type": "AWS::ApiGateway::Authorizer",
                "Properties": {
                    "Name": "tagside-request-authorizer",
                    "RestApiId": { "Ref": "RestApi" },
                    "Type": "COGNITO_USER_POOLS",
                    "IdentitySource": "method.request.header.Authorization",
                    "ProviderARNs": [{ "Fn::GetAtt": ["UserPool", "Arn"] }]
                }
            }),
        ),
        CfnResource::new(
            "RequestValidator",
            json!({
                "Type": "AWS::ApiGateway::RequestValidator",
                "Properties": {
                    "Name": "tagside-request-validator",
                    "RestApiId": { "Ref": "RestApi" },
                    "ValidateRequestBody": true,
                    "ValidateRequestParameters": true
                }
            }),
        ),
        CfnResource::new(
            "IngestMethod",
            json!({
                "Type": "AWS::ApiGateway::Method",
                "Properties": {
                    "RestApiId": { "Ref": "RestApi" },
                    "ResourceId": { "Fn::GetAtt": ["RestApi", "RootResourceId"] },
                    "HttpMethod": "POST",
                    "AuthorizationType": "COGNITO_USER_POOLS",
                    "AuthorizerId": { "Ref": "RequestAuthorizer" },
                    "RequestValidatorId": { "Ref": "RequestValidator" },
                    "Integration": {
                        "Type": "AWS",
                        "IntegrationHttpMethod": "POST",
                        "Uri": { "Fn::Sub": "arn:aws:apigateway:${AWS::Region}:kinesis:action/PutRecords" },
                        "Credentials": { "Fn::GetAtt": ["ApiExecutionRole", "Arn"] },
                        "PassthroughBehavior": "NEVER",
                        "RequestTemplates": {
                            "application/json": put_records_template(&context.stream_name)
                        },
                        "IntegrationResponses": [{ "StatusCode": "200" }]
                    },
                    "MethodResponses": [{ "StatusCode": "200" }]
                }
            }),
        ),
        CfnResource::new(
            "ApiDeployment",
            json!({
                "Type": "AWS::ApiGateway::Deployment",
                "DependsOn": ["IngestMethod"],
                "Properties": { "RestApiId": { "Ref": "RestApi" } }
            }),
        ),
        CfnResource::new(
            "ApiStage",
            json!({
                "Type": "AWS::ApiGateway::Stage",
                // The GetAtt ARN of a log group carries a trailing ":*",
                // which API Gateway rejects as an access-log destination
                "DependsOn": ["ApiAccessLogGroup"],
                "Properties": {
                    "RestApiId": { "Ref": "RestApi" },
                    "DeploymentId": { "Ref": "ApiDeployment" },
                    "StageName": "prod",
                    "MethodSettings": [{
                        "HttpMethod": "*",
                        "ResourcePath": "/*",
                        "LoggingLevel": "ERROR",
                        "DataTraceEnabled": false,
                        "MetricsEnabled": true
                    }],
                    "AccessLogSetting": {
                        "DestinationArn": {
                            "Fn::Sub": "arn:${AWS::Partition}:logs:${AWS::Region}:${AWS::AccountId}:log-group:tagside-api-access"
                        },
                        "Format": "{\"requestId\":\"$context.requestId\",\"ip\":\"$context.identity.sourceIp\",\"requestTime\":\"$context.requestTime\",\"httpMethod\":\"$context.httpMethod\",\"status\":\"$context.status\"}"
                    }
                }
            }),
        ),
    ])
}

/// Containerized producer behind the exported listener, writing to the
/// stream with the SDK
pub(crate) fn producer_service(
    context: &Context,
    tagging: &TaggingOutputs,
) -> eyre::Result<Vec<CfnResource>> {
    let producer_dns = context.producer_dns()?;
    let producer_image = context.producer_image()?;

    Ok(vec![
        CfnResource::new(
            "ProducerLogGroup",
            json!({
                "Type": "AWS::Logs::LogGroup",
                "DeletionPolicy": "Delete",
                "Properties": {
                    "LogGroupName": "tagside-producer-service",
                    "RetentionInDays": 30
                }
            }),
        ),
        CfnResource::new(
            "ProducerTaskExecutionRole",
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
            "ProducerTaskRole",
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
                    "Policies": [{
                        "PolicyName": "PutRecordsPolicy",
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Action": ["kinesis:PutRecords", "kinesis:PutRecord"],
                                "Resource": { "Fn::GetAtt": ["Stream", "Arn"] }
                            }]
                        }
                    }]
                }
            }),
        ),
        CfnResource::new(
            "ProducerSecurityGroup",
            json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": "Inbound traffic from the load balancer to the producer service",
                    "VpcId": import(&tagging.vpc_id),
                    "SecurityGroupIngress": [{
                        "IpProtocol": "tcp",
                        "FromPort": 80,
                        "ToPort": 80,
                        "SourceSecurityGroupId": import(&tagging.ingest_alb_security_group_id)
                    }]
                }
            }),
        ),
        CfnResource::new(
            "ProducerTaskDefinition",
            json!({
                "Type": "AWS::ECS::TaskDefinition",
                "Properties": {
                    "Family": "tagside-producer",
                    "RequiresCompatibilities": ["FARGATE"],
                    "NetworkMode": "awsvpc",
                    "Cpu": "512",
                    "Memory": "1024",
                    "ExecutionRoleArn": { "Fn::GetAtt": ["ProducerTaskExecutionRole", "Arn"] },
                    "TaskRoleArn": { "Fn::GetAtt": ["ProducerTaskRole", "Arn"] },
                    "ContainerDefinitions": [{
                        "Name": "producer",
                        "Image": producer_image,
                        "PortMappings": [{ "ContainerPort": 80 }],
                        "Environment": [
                            { "Name": "REGION", "Value": { "Ref": "AWS::Region" } },
                            { "Name": "STREAM_NAME", "Value": context.stream_name }
                        ],
                        "LogConfiguration": {
                            "LogDriver": "awslogs",
                            "Options": {
                                "awslogs-group": { "Ref": "ProducerLogGroup" },
                                "awslogs-region": { "Ref": "AWS::Region" },
                                "awslogs-stream-prefix": "tagside"
                            }
                        }
                    }]
                }
            }),
        ),
        CfnResource::new(
            "ProducerTargetGroup",
            json!({
                "Type": "AWS::ElasticLoadBalancingV2::TargetGroup",
                "Properties": {
                    "VpcId": import(&tagging.vpc_id),
                    "Port": 80,
                    "Protocol": "HTTP",
                    "TargetType": "ip",
                    "HealthCheckPath": "/healthcheck",
                    "HealthCheckProtocol": "HTTP"
                }
            }),
        ),
        CfnResource::new(
            "ProducerHostRule",
            json!({
                "Type": "AWS::ElasticLoadBalancingV2::ListenerRule",
                "Properties": {
                    "ListenerArn": import(&tagging.ingest_listener_arn),
                    "Priority": tagging.ingest_rule_priority,
                    "Conditions": [{
                        "Field": "host-header",
                        "HostHeaderConfig": { "Values": [producer_dns] }
                    }],
                    "Actions": [{
                        "Type": "forward",
                        "TargetGroupArn": { "Ref": "ProducerTargetGroup" }
                    }]
                }
            }),
        ),
        CfnResource::new(
            "ProducerService",
            json!({
                "Type": "AWS::ECS::Service",
                "DependsOn": ["ProducerHostRule"],
                "Properties": {
                    "ServiceName": "tagside-producer",
                    "Cluster": import(&tagging.cluster_name),
                    "LaunchType": "FARGATE",
                    "DesiredCount": 2,
                    "TaskDefinition": { "Ref": "ProducerTaskDefinition" },
                    "NetworkConfiguration": {
                        "AwsvpcConfiguration": {
                            "Subnets": [
                                import(&tagging.private_subnet_ids[0]),
                                import(&tagging.private_subnet_ids[1])
                            ],
                            "SecurityGroups": [{ "Ref": "ProducerSecurityGroup" }],
                            "AssignPublicIp": "DISABLED"
                        }
                    },
                    "LoadBalancers": [{
                        "ContainerName": "producer",
                        "ContainerPort": 80,
                        "TargetGroupArn": { "Ref": "ProducerTargetGroup" }
                    }]
                }
            }),
        ),
    ])
}
