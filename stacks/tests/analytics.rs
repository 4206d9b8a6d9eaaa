use serde_json::json;
use tagside_stacks::{assertions, AnalyticsStack, Context, TaggingStack, Template};

fn api_gateway_context() -> Context {
    Context::from_str(
        r#"
            ssl_cert_arn = "arn:aws:acm:eu-west-1:111111111111:certificate/abc"
            tagging_image = "gcr.io/cloud-tagging-10302018/gtm-cloud-image:stable"
            container_config = "aWQ9R1RNLTAwMDAwMDA="
            primary_dns = "tags.example.com"
            preview_dns = "preview.example.com"
            root_dns = "example.com"
        "#,
    )
    .unwrap()
}

fn producer_context(topology: &str) -> Context {
    Context::from_str(&format!(
        r#"
            ssl_cert_arn = "arn:aws:acm:eu-west-1:111111111111:certificate/abc"
            tagging_image = "gcr.io/cloud-tagging-10302018/gtm-cloud-image:stable"
            container_config = "aWQ9R1RNLTAwMDAwMDA="
            primary_dns = "tags.example.com"
            preview_dns = "preview.example.com"
            root_dns = "example.com"
            topology = "{topology}"
            ingestion = "producer-service"
            producer_dns = "collect.example.com"
            producer_image = "111111111111.dkr.ecr.eu-west-1.amazonaws.com/producer:latest"
        "#
    ))
    .unwrap()
}

fn synth_both(context: &Context) -> (Template, Template) {
    let (tagging, outputs) = TaggingStack::synth(context).unwrap();
    let analytics = AnalyticsStack::synth(context, &outputs).unwrap();
    (tagging, analytics)
}

#[test]
fn api_gateway_path_has_one_authorized_validated_method() {
    let (_, analytics) = synth_both(&api_gateway_context());

    assert_eq!(
        assertions::count_resources(&analytics, "AWS::ApiGateway::Method"),
        1
    );

    let method = assertions::properties(&analytics, "IngestMethod");
    assert_eq!(method["AuthorizationType"], json!("COGNITO_USER_POOLS"));
    assert_eq!(method["AuthorizerId"], json!({ "Ref": "RequestAuthorizer" }));
    assert_eq!(
        method["RequestValidatorId"],
        json!({ "Ref": "RequestValidator" })
    );

    assert_eq!(
        method["Integration"]["Uri"],
        json!({ "Fn::Sub": "arn:aws:apigateway:${AWS::Region}:kinesis:action/PutRecords" })
    );

    let mapping = method["Integration"]["RequestTemplates"]["application/json"]
        .as_str()
        .unwrap();
    assert!(mapping.contains("\"StreamName\":\"tagside-events\""));
}

#[test]
fn api_gateway_is_private_behind_the_tagging_endpoint() {
    let (_, analytics) = synth_both(&api_gateway_context());

    let api = assertions::properties(&analytics, "RestApi");
    assert_eq!(api["EndpointConfiguration"]["Types"], json!(["PRIVATE"]));
    assert_eq!(
        api["EndpointConfiguration"]["VpcEndpointIds"][0],
        json!({ "Fn::ImportValue": "tagside-tagging:ApiGatewayEndpointId" })
    );

    // No containerized producer on this path
    assert_eq!(assertions::count_resources(&analytics, "AWS::ECS::Service"), 0);
}

#[test]
fn api_stage_logs_to_a_destination_arn_without_a_stream_suffix() {
    let (_, analytics) = synth_both(&api_gateway_context());

    let stage = assertions::properties(&analytics, "ApiStage");
    let destination = &stage["AccessLogSetting"]["DestinationArn"];

    // GetAtt on a log group resolves to an ARN ending in ":*", which the
    // stage refuses, so the ARN is composed explicitly
    let arn = destination["Fn::Sub"].as_str().unwrap();
    assert!(arn.ends_with("log-group:tagside-api-access"));
    assert!(!arn.ends_with(":*"));
}

#[test]
fn dual_lb_producer_topology_matches_the_expected_shape() {
    let (tagging, analytics) = synth_both(&producer_context("dual-lb"));

    let load_balancers = assertions::count_resources(
        &tagging,
        "AWS::ElasticLoadBalancingV2::LoadBalancer",
    ) + assertions::count_resources(
        &analytics,
        "AWS::ElasticLoadBalancingV2::LoadBalancer",
    );
    assert_eq!(load_balancers, 2);

    let target_groups = assertions::count_resources(
        &tagging,
        "AWS::ElasticLoadBalancingV2::TargetGroup",
    ) + assertions::count_resources(
        &analytics,
        "AWS::ElasticLoadBalancingV2::TargetGroup",
    );
    assert_eq!(target_groups, 2);

    // Host rules exist for both public hostnames
    let primary_rule = assertions::properties(&tagging, "PrimaryHostRule");
    assert_eq!(
        primary_rule["Conditions"][0]["HostHeaderConfig"]["Values"],
        json!(["tags.example.com"])
    );

    let producer_rule = assertions::properties(&analytics, "ProducerHostRule");
    assert_eq!(
        producer_rule["Conditions"][0]["HostHeaderConfig"]["Values"],
        json!(["collect.example.com"])
    );
    assert_eq!(producer_rule["Priority"], json!(1));
}

#[test]
fn single_lb_producer_rule_yields_to_the_primary_rule() {
    let (_, analytics) = synth_both(&producer_context("single-lb"));

    let rule = assertions::properties(&analytics, "ProducerHostRule");
    assert_eq!(rule["Priority"], json!(2));
    assert_eq!(
        rule["ListenerArn"],
        json!({ "Fn::ImportValue": "tagside-tagging:IngestListenerArn" })
    );
}

#[test]
fn producer_service_joins_the_shared_cluster() {
    let (_, analytics) = synth_both(&producer_context("dual-lb"));

    let service = assertions::properties(&analytics, "ProducerService");
    assert_eq!(
        service["Cluster"],
        json!({ "Fn::ImportValue": "tagside-tagging:ClusterName" })
    );

    let target_group = assertions::properties(&analytics, "ProducerTargetGroup");
    assert_eq!(target_group["HealthCheckPath"], json!("/healthcheck"));

    let task = assertions::properties(&analytics, "ProducerTaskDefinition");
    let environment = &task["ContainerDefinitions"][0]["Environment"];
    assert_eq!(
        environment[1],
        json!({ "Name": "STREAM_NAME", "Value": "tagside-events" })
    );
}

#[test]
fn both_ingestion_paths_converge_on_the_same_delivery_pipeline() {
    for context in [api_gateway_context(), producer_context("dual-lb")] {
        let (_, analytics) = synth_both(&context);

        let stream = assertions::properties(&analytics, "Stream");
        assert_eq!(stream["Name"], json!("tagside-events"));

        let firehose = assertions::properties(&analytics, "DeliveryStream");
        assert_eq!(firehose["DeliveryStreamType"], json!("KinesisStreamAsSource"));
        assert_eq!(
            firehose["KinesisStreamSourceConfiguration"]["KinesisStreamARN"],
            json!({ "Fn::GetAtt": ["Stream", "Arn"] })
        );
        assert_eq!(
            firehose["S3DestinationConfiguration"]["BucketARN"],
            json!({ "Fn::GetAtt": ["DataBucket", "Arn"] })
        );

        assert_eq!(assertions::count_resources(&analytics, "AWS::S3::Bucket"), 2);
    }
}

#[test]
fn data_buckets_enforce_ssl_and_access_logging() {
    let (_, analytics) = synth_both(&api_gateway_context());

    let data_bucket = assertions::properties(&analytics, "DataBucket");
    assert_eq!(
        data_bucket["LoggingConfiguration"]["DestinationBucketName"],
        json!({ "Ref": "AccessLogBucket" })
    );

    for policy in ["DataBucketPolicy", "AccessLogBucketPolicy"] {
        let policy = assertions::properties(&analytics, policy);
        let deny = &policy["PolicyDocument"]["Statement"][0];
        assert_eq!(deny["Effect"], json!("Deny"));
        assert_eq!(
            deny["Condition"],
            json!({ "Bool": { "aws:SecureTransport": "false" } })
        );
    }
}
