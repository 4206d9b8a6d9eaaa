use serde_json::json;
use tagside_stacks::{assertions, Context, TaggingStack};

fn single_lb_context() -> Context {
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

fn dual_lb_context() -> Context {
    Context::from_str(
        r#"
            ssl_cert_arn = "arn:aws:acm:eu-west-1:111111111111:certificate/abc"
            tagging_image = "gcr.io/cloud-tagging-10302018/gtm-cloud-image:stable"
            container_config = "aWQ9R1RNLTAwMDAwMDA="
            primary_dns = "tags.example.com"
            preview_dns = "preview.example.com"
            root_dns = "example.com"
            topology = "dual-lb"
            ingestion = "producer-service"
            producer_dns = "collect.example.com"
            producer_image = "111111111111.dkr.ecr.eu-west-1.amazonaws.com/producer:latest"
        "#,
    )
    .unwrap()
}

#[test]
fn single_lb_routes_primary_at_priority_one_with_preview_default() {
    let (template, _) = TaggingStack::synth(&single_lb_context()).unwrap();

    assert_eq!(
        assertions::count_resources(&template, "AWS::ElasticLoadBalancingV2::LoadBalancer"),
        1
    );
    assert_eq!(
        assertions::count_resources(&template, "AWS::ElasticLoadBalancingV2::TargetGroup"),
        2
    );

    let rule = assertions::properties(&template, "PrimaryHostRule");
    assert_eq!(rule["Priority"], json!(1));
    assert_eq!(
        rule["Conditions"][0]["HostHeaderConfig"]["Values"],
        json!(["tags.example.com"])
    );
    assert_eq!(
        rule["Actions"][0]["TargetGroupArn"],
        json!({ "Ref": "PrimaryTargetGroup" })
    );

    let listener = assertions::properties(&template, "HttpsListener");
    assert_eq!(
        listener["DefaultActions"][0]["TargetGroupArn"],
        json!({ "Ref": "PreviewTargetGroup" })
    );
}

#[test]
fn dual_lb_synthesizes_two_load_balancers() {
    let (template, outputs) = TaggingStack::synth(&dual_lb_context()).unwrap();

    assert_eq!(
        assertions::count_resources(&template, "AWS::ElasticLoadBalancingV2::LoadBalancer"),
        2
    );

    // The producer listener has no target group of its own yet, the
    // analytics stack attaches one through the exported ARN
    let listener = assertions::properties(&template, "ProducerHttpsListener");
    assert_eq!(listener["DefaultActions"][0]["Type"], json!("fixed-response"));
    assert_eq!(outputs.ingest_rule_priority, 1);

    // Preview runs without a load balancer in this topology
    let preview = assertions::properties(&template, "PreviewService");
    assert!(preview.get("LoadBalancers").is_none());
}

#[test]
fn api_gateway_ingestion_gets_a_vpc_endpoint() {
    let (template, outputs) = TaggingStack::synth(&single_lb_context()).unwrap();

    assert_eq!(assertions::count_resources(&template, "AWS::EC2::VPCEndpoint"), 1);
    assert_eq!(
        assertions::export_name(&template, "ApiGatewayEndpointId"),
        Some("tagside-tagging:ApiGatewayEndpointId")
    );
    assert!(outputs.apigw_endpoint_id.is_some());
}

#[test]
fn producer_ingestion_skips_the_vpc_endpoint() {
    let (template, outputs) = TaggingStack::synth(&dual_lb_context()).unwrap();

    assert_eq!(assertions::count_resources(&template, "AWS::EC2::VPCEndpoint"), 0);
    assert!(outputs.apigw_endpoint_id.is_none());
}

#[test]
fn primary_service_scales_between_two_and_ten_tasks() {
    let (template, _) = TaggingStack::synth(&single_lb_context()).unwrap();

    let target = assertions::properties(&template, "PrimaryScalableTarget");
    assert_eq!(target["MinCapacity"], json!(2));
    assert_eq!(target["MaxCapacity"], json!(10));

    for policy in ["PrimaryCpuScaling", "PrimaryMemoryScaling"] {
        let policy = assertions::properties(&template, policy);
        assert_eq!(
            policy["TargetTrackingScalingPolicyConfiguration"]["TargetValue"],
            json!(50.0)
        );
    }
}

#[test]
fn services_run_with_expected_task_counts() {
    let (template, _) = TaggingStack::synth(&single_lb_context()).unwrap();

    assert_eq!(
        assertions::properties(&template, "PrimaryService")["DesiredCount"],
        json!(3)
    );
    assert_eq!(
        assertions::properties(&template, "PreviewService")["DesiredCount"],
        json!(1)
    );
}

#[test]
fn preview_hostname_resolves_through_the_private_zone() {
    let (template, _) = TaggingStack::synth(&single_lb_context()).unwrap();

    let zone = assertions::properties(&template, "HostedZone");
    assert_eq!(zone["Name"], json!("example.com"));

    let record = assertions::properties(&template, "PreviewDnsRecord");
    assert_eq!(record["Type"], json!("CNAME"));
    assert_eq!(record["Name"], json!("preview.example.com"));
    assert_eq!(
        record["ResourceRecords"][0],
        json!({ "Fn::GetAtt": ["LoadBalancer", "DNSName"] })
    );
}

#[test]
fn network_spans_two_availability_zones() {
    let (template, _) = TaggingStack::synth(&single_lb_context()).unwrap();

    assert_eq!(assertions::count_resources(&template, "AWS::EC2::Subnet"), 4);
    assert_eq!(assertions::count_resources(&template, "AWS::EC2::NatGateway"), 2);

    let health_checked = assertions::any_resource_has(
        &template,
        "AWS::ElasticLoadBalancingV2::TargetGroup",
        |properties| properties["HealthCheckPath"] == json!("/healthz"),
    );
    assert!(health_checked);
}
