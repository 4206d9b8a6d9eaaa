use crate::context::Context;
use crate::template::CfnResource;
use serde_json::{json, Value};

/// Stream-to-storage delivery: the data stream, the Firehose pipeline and
/// the destination buckets, shared by both ingestion paths
pub(crate) fn resources(context: &Context) -> Vec<CfnResource> {
    vec![
        CfnResource::new(
            "Stream",
            json!({
                "Type": "AWS::Kinesis::Stream",
                "Properties": {
                    "Name": context.stream_name,
                    "ShardCount": 1,
                    "RetentionPeriodHours": 24,
                    "StreamEncryption": {
                        "EncryptionType": "KMS",
                        "KeyId": "alias/aws/kinesis"
                    }
                }
            }),
        ),
        CfnResource::new(
            "AccessLogBucket",
            json!({
                "Type": "AWS::S3::Bucket",
                "DeletionPolicy": "Delete",
                "Properties": {
                    "BucketName": { "Fn::Sub": "s3-access-log-${AWS::AccountId}-${AWS::Region}" },
                    "BucketEncryption": sse_s3(),
                    "PublicAccessBlockConfiguration": public_access_block()
                }
            }),
        ),
        bucket_ssl_policy("AccessLogBucketPolicy", "AccessLogBucket", true),
        CfnResource::new(
            "DataBucket",
            json!({
                "Type": "AWS::S3::Bucket",
                "DeletionPolicy": "Delete",
                "Properties": {
                    "BucketName": { "Fn::Sub": "tagside-data-${AWS::AccountId}-${AWS::Region}" },
                    "BucketEncryption": sse_s3(),
                    "PublicAccessBlockConfiguration": public_access_block(),
                    "LoggingConfiguration": {
                        "DestinationBucketName": { "Ref": "AccessLogBucket" },
                        "LogFilePrefix": "data/"
                    }
                }
            }),
        ),
        bucket_ssl_policy("DataBucketPolicy", "DataBucket", false),
        CfnResource::new(
            "DeliveryLogGroup",
            json!({
                "Type": "AWS::Logs::LogGroup",
                "DeletionPolicy": "Delete",
                "Properties": {
                    "LogGroupName": "/aws/kinesisfirehose/tagside",
                    "RetentionInDays": 30
                }
            }),
        ),
        CfnResource::new(
            "DeliveryLogStream",
            json!({
                "Type": "AWS::Logs::LogStream",
                "Properties": {
                    "LogGroupName": { "Ref": "DeliveryLogGroup" },
                    "LogStreamName": "delivery"
                }
            }),
        ),
        CfnResource::new(
            "DeliveryRole",
            json!({
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "AssumeRolePolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Principal": { "Service": ["firehose.amazonaws.com"] },
                            "Action": ["sts:AssumeRole"]
                        }]
                    },
                    "Policies": [{
                        "PolicyName": "DeliveryPolicy",
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [
                                {
                                    "Effect": "Allow",
                                    "Action": [
                                        "kinesis:DescribeStream",
                                        "kinesis:GetRecords",
                                        "kinesis:GetShardIterator",
                                        "kinesis:ListShards"
                                    ],
                                    "Resource": { "Fn::GetAtt": ["Stream", "Arn"] }
                                },
                                {
                                    "Effect": "Allow",
                                    "Action": [
                                        "s3:AbortMultipartUpload",
                                        "s3:GetBucketLocation",
                                        "s3:GetObject",
                                        "s3:ListBucket",
                                        "s3:ListBucketMultipartUploads",
                                        "s3:PutObject"
                                    ],
                                    "Resource": [
                                        { "Fn::GetAtt": ["DataBucket", "Arn"] },
                                        { "Fn::Sub": "${DataBucket.Arn}/*" }
                                    ]
                                },
                                {
                                    "Effect": "Allow",
                                    "Action": ["logs:PutLogEvents"],
                                    "Resource": { "Fn::GetAtt": ["DeliveryLogGroup", "Arn"] }
                                }
                            ]
                        }
                    }]
                }
            }),
        ),
        CfnResource::new(
            "DeliveryStream",
            json!({
                "Type": "AWS::KinesisFirehose::DeliveryStream",
                "Properties": {
                    "DeliveryStreamName": "tagside-delivery",
                    "DeliveryStreamType": "KinesisStreamAsSource",
                    "KinesisStreamSourceConfiguration": {
                        "KinesisStreamARN": { "Fn::GetAtt": ["Stream", "Arn"] },
                        "RoleARN": { "Fn::GetAtt": ["DeliveryRole", "Arn"] }
                    },
                    "S3DestinationConfiguration": {
                        "BucketARN": { "Fn::GetAtt": ["DataBucket", "Arn"] },
                        "RoleARN": { "Fn::GetAtt": ["DeliveryRole", "Arn"] },
                        "BufferingHints": {
                            "IntervalInSeconds": 60,
                            "SizeInMBs": 5
                        },
                        "CompressionFormat": "GZIP",
                        "CloudWatchLoggingOptions": {
                            "Enabled": true,
                            "LogGroupName": { "Ref": "DeliveryLogGroup" },
                            "LogStreamName": { "Ref": "DeliveryLogStream" }
                        }
                    }
                }
            }),
        ),
    ]
}

fn sse_s3() -> Value {
    json!({
        "ServerSideEncryptionConfiguration": [{
            "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" }
        }]
    })
}

fn public_access_block() -> Value {
    json!({
        "BlockPublicAcls": true,
        "BlockPublicPolicy": true,
        "IgnorePublicAcls": true,
        "RestrictPublicBuckets": true
    })
}

/// Deny any request that is not made over TLS, and for the access-log
/// bucket additionally admit the S3 logging service
fn bucket_ssl_policy(name: &str, bucket: &str, with_logging_service: bool) -> CfnResource {
    let mut statements = vec![json!({
        "Effect": "Deny",
        "Principal": "*",
        "Action": "s3:*",
        "Resource": [
            { "Fn::GetAtt": [bucket, "Arn"] },
            { "Fn::Sub": format!("${{{bucket}.Arn}}/*") }
        ],
        "Condition": { "Bool": { "aws:SecureTransport": "false" } }
    })];

    if with_logging_service {
        statements.push(json!({
            "Effect": "Allow",
            "Principal": { "Service": "logging.s3.amazonaws.com" },
            "Action": "s3:PutObject",
            "Resource": { "Fn::Sub": format!("${{{bucket}.Arn}}/*") },
            "Condition": {
                "StringEquals": { "aws:SourceAccount": { "Ref": "AWS::AccountId" } }
            }
        }));
    }

    CfnResource::new(
        name,
        json!({
            "Type": "AWS::S3::BucketPolicy",
            "Properties": {
                "Bucket": { "Ref": bucket },
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": statements
                }
            }
        }),
    )
}
