mod delivery;
mod ingest;

use crate::context::{Context, Ingestion};
use crate::tagging::TaggingOutputs;
use crate::template::Template;
use serde_json::json;

pub const STACK_NAME: &str = "tagside-analytics";

/// Analytics stack: one of the two ingestion paths feeding the shared
/// stream-to-storage delivery pipeline
pub struct AnalyticsStack;

impl AnalyticsStack {
    /// Synthesize the analytics template against the tagging stack exports
    pub fn synth(context: &Context, tagging: &TaggingOutputs) -> eyre::Result<Template> {
        let mut template = Template::new(
            STACK_NAME,
            "Analytics ingestion and delivery: event intake, data stream and destination storage",
        );

        // The only decision point with more than one outcome: both branches
        // converge on the same stream defined in the delivery module.
        match context.ingestion {
            Ingestion::ApiGateway => {
                template.add_resources(ingest::api_gateway(context, tagging)?)
            }
            Ingestion::ProducerService => {
                template.add_resources(ingest::producer_service(context, tagging)?)
            }
        }

        template.add_resources(delivery::resources(context));

        template.add_output("StreamArn", json!({ "Fn::GetAtt": ["Stream", "Arn"] }), None);
        template.add_output("DataBucketName", json!({ "Ref": "DataBucket" }), None);

        Ok(template)
    }
}
