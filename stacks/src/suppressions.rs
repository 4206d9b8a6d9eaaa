use serde::Serialize;

/// A declared exception accepting a specific automated compliance finding
///
/// Emitted next to each synthesized template for the scanning pass.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Suppression {
    pub id: &'static str,
    pub reason: &'static str,
}

pub const TAGGING: &[Suppression] = &[
    Suppression {
        id: "AwsSolutions-IAM4",
        reason: "AWS managed IAM policies are allowed to keep operational maintenance simple; custom policies can replace them for more granular control",
    },
    Suppression {
        id: "AwsSolutions-IAM5",
        reason: "AWS managed policies occasionally use wildcards in resources; accepted for the same maintenance reason as IAM4",
    },
    Suppression {
        id: "AwsSolutions-VPC7",
        reason: "The VPC does not have an associated flow log",
    },
    Suppression {
        id: "AwsSolutions-ECS2",
        reason: "The task definitions specify environment variables directly; the tagging container is configured through them",
    },
    Suppression {
        id: "AwsSolutions-ECS4",
        reason: "CloudWatch Container Insights is disabled on the cluster",
    },
    Suppression {
        id: "AwsSolutions-ELB2",
        reason: "The load balancers do not have access logs enabled",
    },
    Suppression {
        id: "AwsSolutions-EC23",
        reason: "Security group parameter references an intrinsic function",
    },
];

pub const ANALYTICS: &[Suppression] = &[
    Suppression {
        id: "AwsSolutions-IAM4",
        reason: "The managed policy AmazonAPIGatewayPushToCloudWatchLogs is required for API Gateway CloudWatch logging",
    },
    Suppression {
        id: "AwsSolutions-IAM5",
        reason: "The wildcard gives Kinesis Firehose access to all prefixes in the data bucket",
    },
    Suppression {
        id: "AwsSolutions-S1",
        reason: "Access logs are enabled for all data buckets; the access-log bucket itself has no access log of its own",
    },
    Suppression {
        id: "AwsSolutions-APIG3",
        reason: "The REST API stage is not associated with a WAFv2 web ACL",
    },
    Suppression {
        id: "AwsSolutions-COG2",
        reason: "The Cognito user pool does not require MFA",
    },
    Suppression {
        id: "AwsSolutions-KDS3",
        reason: "The data stream uses the aws/kinesis service key instead of a customer managed key",
    },
    Suppression {
        id: "AwsSolutions-KDF1",
        reason: "The Firehose delivery stream does not enforce server-side encryption of its own",
    },
];

/// Serialize a suppression list the way the scanner consumes it
pub fn to_json_pretty(suppressions: &[Suppression]) -> eyre::Result<String> {
    serde_json::to_string_pretty(suppressions)
        .map_err(|e| eyre::eyre!("Failed to serialize suppressions: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_carry_id_and_reason() {
        for suppression in TAGGING.iter().chain(ANALYTICS) {
            assert!(suppression.id.starts_with("AwsSolutions-"));
            assert!(!suppression.reason.is_empty());
        }
    }

    #[test]
    fn serializes_to_an_array() {
        let json = to_json_pretty(ANALYTICS).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.as_array().unwrap().len(), ANALYTICS.len());
    }
}
