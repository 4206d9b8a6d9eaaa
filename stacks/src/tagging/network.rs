use crate::context::{Context, Ingestion};
use crate::template::CfnResource;
use serde_json::json;

const VPC_CIDR: &str = "10.0.0.0/16";

/// VPC with a public and a private subnet in each of two AZs, one NAT
/// gateway per AZ, and (for api-gateway ingestion) the execute-api
/// interface endpoint the private REST API is reached through
pub(crate) fn resources(context: &Context) -> Vec<CfnResource> {
    let mut resources = vec![
        CfnResource::new(
            "Vpc",
            json!({
                "Type": "AWS::EC2::VPC",
                "Properties": {
                    "CidrBlock": VPC_CIDR,
                    "EnableDnsSupport": true,
                    "EnableDnsHostnames": true,
                    "Tags": [{ "Key": "Name", "Value": "tagside-vpc" }]
                }
            }),
        ),
        CfnResource::new(
            "InternetGateway",
            json!({ "Type": "AWS::EC2::InternetGateway" }),
        ),
        CfnResource::new(
            "VpcGatewayAttachment",
            json!({
                "Type": "AWS::EC2::VPCGatewayAttachment",
                "Properties": {
                    "VpcId": { "Ref": "Vpc" },
                    "InternetGatewayId": { "Ref": "InternetGateway" }
                }
            }),
        ),
        CfnResource::new(
            "PublicRouteTable",
            json!({
                "Type": "AWS::EC2::RouteTable",
                "Properties": { "VpcId": { "Ref": "Vpc" } }
            }),
        ),
        CfnResource::new(
            "PublicDefaultRoute",
            json!({
                "Type": "AWS::EC2::Route",
                "DependsOn": ["VpcGatewayAttachment"],
                "Properties": {
                    "RouteTableId": { "Ref": "PublicRouteTable" },
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "GatewayId": { "Ref": "InternetGateway" }
                }
            }),
        ),
    ];

    for (az_index, suffix, public_cidr, private_cidr) in [
        (0, "A", "10.0.0.0/20", "10.0.128.0/20"),
        (1, "B", "10.0.16.0/20", "10.0.144.0/20"),
    ] {
        resources.extend(availability_zone(az_index, suffix, public_cidr, private_cidr));
    }

    if context.ingestion == Ingestion::ApiGateway {
        resources.extend(apigw_endpoint());
    }

    resources
}

/// Subnet pair, NAT gateway and routing for one availability zone
fn availability_zone(
    az_index: u32,
    suffix: &str,
    public_cidr: &str,
    private_cidr: &str,
) -> Vec<CfnResource> {
    let az = json!({ "Fn::Select": [az_index, { "Fn::GetAZs": "" }] });

    vec![
        CfnResource::new(
            &format!("PublicSubnet{suffix}"),
            json!({
                "Type": "AWS::EC2::Subnet",
                "Properties": {
                    "VpcId": { "Ref": "Vpc" },
                    "CidrBlock": public_cidr,
                    "AvailabilityZone": az,
                    "MapPublicIpOnLaunch": true
                }
            }),
        ),
        CfnResource::new(
            &format!("PublicSubnet{suffix}RouteTableAssociation"),
            json!({
                "Type": "AWS::EC2::SubnetRouteTableAssociation",
                "Properties": {
                    "SubnetId": { "Ref": format!("PublicSubnet{suffix}") },
                    "RouteTableId": { "Ref": "PublicRouteTable" }
                }
            }),
        ),
        CfnResource::new(
            &format!("PrivateSubnet{suffix}"),
            json!({
                "Type": "AWS::EC2::Subnet",
                "Properties": {
                    "VpcId": { "Ref": "Vpc" },
                    "CidrBlock": private_cidr,
                    "AvailabilityZone": az
                }
            }),
        ),
        CfnResource::new(
            &format!("NatEip{suffix}"),
            json!({
                "Type": "AWS::EC2::EIP",
                "Properties": { "Domain": "vpc" }
            }),
        ),
        CfnResource::new(
            &format!("NatGateway{suffix}"),
            json!({
                "Type": "AWS::EC2::NatGateway",
                "Properties": {
                    "SubnetId": { "Ref": format!("PublicSubnet{suffix}") },
                    "AllocationId": { "Fn::GetAtt": [format!("NatEip{suffix}"), "AllocationId"] }
                }
            }),
        ),
        CfnResource::new(
            &format!("PrivateRouteTable{suffix}"),
            json!({
                "Type": "AWS::EC2::RouteTable",
                "Properties": { "VpcId": { "Ref": "Vpc" } }
            }),
        ),
        CfnResource::new(
            &format!("PrivateDefaultRoute{suffix}"),
            json!({
                "Type": "AWS::EC2::Route",
                "Properties": {
                    "RouteTableId": { "Ref": format!("PrivateRouteTable{suffix}") },
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "NatGatewayId": { "Ref": format!("NatGateway{suffix}") }
                }
            }),
        ),
        CfnResource::new(
            &format!("PrivateSubnet{suffix}RouteTableAssociation"),
            json!({
                "Type": "AWS::EC2::SubnetRouteTableAssociation",
                "Properties": {
                    "SubnetId": { "Ref": format!("PrivateSubnet{suffix}") },
                    "RouteTableId": { "Ref": format!("PrivateRouteTable{suffix}") }
                }
            }),
        ),
    ]
}

/// Interface endpoint letting the tagging containers reach the private
/// REST API without leaving the VPC
fn apigw_endpoint() -> Vec<CfnResource> {
    vec![
        CfnResource::new(
            "ApiEndpointSecurityGroup",
            json!({
                "Type": "AWS::EC2::SecurityGroup",
                "Properties": {
                    "GroupDescription": "HTTPS to the execute-api endpoint from within the VPC",
                    "VpcId": { "Ref": "Vpc" },
                    "SecurityGroupIngress": [{
                        "IpProtocol": "tcp",
                        "FromPort": 443,
                        "ToPort": 443,
                        "CidrIp": VPC_CIDR
                    }]
                }
            }),
        ),
        CfnResource::new(
            "ApiGatewayEndpoint",
            json!({
                "Type": "AWS::EC2::VPCEndpoint",
                "Properties": {
                    "VpcId": { "Ref": "Vpc" },
                    "VpcEndpointType": "Interface",
                    "ServiceName": { "Fn::Sub": "com.amazonaws.${AWS::Region}.execute-api" },
                    "PrivateDnsEnabled": true,
                    "SubnetIds": [
                        { "Ref": "PrivateSubnetA" },
                        { "Ref": "PrivateSubnetB" }
                    ],
                    "SecurityGroupIds": [{ "Ref": "ApiEndpointSecurityGroup" }]
                }
            }),
        ),
    ]
}
