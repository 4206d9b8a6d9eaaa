use eyre::{bail, WrapErr};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Which resource subgraph the routing layer synthesizes
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// One load balancer shared by all services, routed by host header
    #[default]
    SingleLb,

    /// Separate load balancers for the tagging side and the producer side
    DualLb,
}

/// How tagged events reach the data stream
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Ingestion {
    /// Private REST API integrated directly with the stream
    #[default]
    ApiGateway,

    /// Containerized producer service writing to the stream with the SDK
    ProducerService,
}

/// Context is the structure of tagside.toml
///
/// All deployment parameters live here, typed, instead of being looked up
/// by string key at synthesis time. Missing or incoherent values fail
/// before any template is produced.
#[derive(Clone, Debug, Deserialize)]
pub struct Context {
    /// ARN of an existing ACM certificate for the HTTPS listeners
    pub ssl_cert_arn: String,

    /// Container image reference for the tagging server
    pub tagging_image: String,

    /// Opaque container configuration payload passed to the tagging containers
    pub container_config: String,

    /// Host name routed to the primary tagging service
    pub primary_dns: String,

    /// Host name of the preview service, resolved through the private zone
    pub preview_dns: String,

    /// Private hosted zone name
    pub root_dns: String,

    /// Host name routed to the producer service (producer-service ingestion only)
    #[serde(default)]
    pub producer_dns: Option<String>,

    /// Container image reference for the producer service
    #[serde(default)]
    pub producer_image: Option<String>,

    /// Kinesis data stream name
    #[serde(default = "default_stream_name")]
    pub stream_name: String,

    #[serde(default)]
    pub topology: Topology,

    #[serde(default)]
    pub ingestion: Ingestion,

    /// [aws]
    /// account = "111111111111"
    /// region = "eu-west-1"
    #[serde(default)]
    pub aws: AwsSection,
}

/// Target account and region
///
/// Both are optional in the file and fall back to `TAGSIDE_ACCOUNT` and
/// `TAGSIDE_REGION` environment variables. When neither is set the deploy
/// commands resolve them from the active credentials.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AwsSection {
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub region: Option<String>,
}

impl AwsSection {
    pub fn account(&self) -> Option<String> {
        self.account
            .clone()
            .or_else(|| std::env::var("TAGSIDE_ACCOUNT").ok())
    }

    pub fn region(&self) -> Option<String> {
        self.region
            .clone()
            .or_else(|| std::env::var("TAGSIDE_REGION").ok())
    }
}

fn default_stream_name() -> String {
    "tagside-events".to_string()
}

impl Context {
    /// Reads a `Context` instance from a given directory path
    ///
    /// This function looks for a `tagside.toml` file in the specified
    /// directory and validates it.
    pub fn from_dir(path: &Path) -> eyre::Result<Self> {
        let context_path = path.join("tagside.toml");

        let toml_string = fs::read_to_string(&context_path)
            .wrap_err_with(|| format!("Failed to read {context_path:?}"))?;

        Self::from_str(&toml_string)
    }

    pub fn from_str(toml_string: &str) -> eyre::Result<Self> {
        let context: Context =
            toml::from_str(toml_string).wrap_err("Failed to parse tagside.toml")?;

        context.validate()?;
        Ok(context)
    }

    /// Reject incoherent flag combinations before any synthesis happens
    fn validate(&self) -> eyre::Result<()> {
        for (value, key) in [
            (&self.ssl_cert_arn, "ssl_cert_arn"),
            (&self.tagging_image, "tagging_image"),
            (&self.primary_dns, "primary_dns"),
            (&self.preview_dns, "preview_dns"),
            (&self.root_dns, "root_dns"),
        ] {
            if value.is_empty() {
                bail!("\"{key}\" must not be empty in tagside.toml");
            }
        }

        if !self.ssl_cert_arn.starts_with("arn:") {
            bail!("\"ssl_cert_arn\" is not an ARN: {}", self.ssl_cert_arn);
        }

        // The second load balancer exists only to front the producer service
        if self.topology == Topology::DualLb && self.ingestion != Ingestion::ProducerService {
            bail!("topology = \"dual-lb\" requires ingestion = \"producer-service\"");
        }

        if self.ingestion == Ingestion::ProducerService {
            if self.producer_dns.as_deref().unwrap_or_default().is_empty() {
                bail!("\"producer_dns\" is required for producer-service ingestion");
            }

            if self
                .producer_image
                .as_deref()
                .unwrap_or_default()
                .is_empty()
            {
                bail!("\"producer_image\" is required for producer-service ingestion");
            }
        }

        Ok(())
    }

    /// Host name of the producer service
    ///
    /// Only valid after validation passed for producer-service ingestion.
    pub fn producer_dns(&self) -> eyre::Result<&str> {
        self.producer_dns
            .as_deref()
            .ok_or_else(|| eyre::eyre!("No producer_dns in context"))
    }

    pub fn producer_image(&self) -> eyre::Result<&str> {
        self.producer_image
            .as_deref()
            .ok_or_else(|| eyre::eyre!("No producer_image in context"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> String {
        r#"
            ssl_cert_arn = "arn:aws:acm:eu-west-1:111111111111:certificate/abc"
            tagging_image = "gcr.io/cloud-tagging-10302018/gtm-cloud-image:stable"
            container_config = "aWQ9R1RNLTAwMDAwMDA="
            primary_dns = "tags.example.com"
            preview_dns = "preview.example.com"
            root_dns = "example.com"
        "#
        .to_string()
    }

    #[test]
    fn defaults_to_single_lb_api_gateway() {
        let context = Context::from_str(&minimal()).unwrap();

        assert_eq!(context.topology, Topology::SingleLb);
        assert_eq!(context.ingestion, Ingestion::ApiGateway);
        assert_eq!(context.stream_name, "tagside-events");
    }

    #[test]
    fn rejects_dual_lb_without_producer() {
        let toml = minimal() + "topology = \"dual-lb\"\n";
        assert!(Context::from_str(&toml).is_err());
    }

    #[test]
    fn rejects_producer_ingestion_without_image() {
        let toml = minimal() + "ingestion = \"producer-service\"\nproducer_dns = \"collect.example.com\"\n";
        assert!(Context::from_str(&toml).is_err());
    }

    #[test]
    fn rejects_malformed_certificate_arn() {
        let toml = minimal().replace("arn:aws:acm", "not-an-arn:acm");
        assert!(Context::from_str(&toml).is_err());
    }

    #[test]
    fn aws_section_prefers_file_over_environment() {
        std::env::set_var("TAGSIDE_ACCOUNT", "999999999999");
        std::env::set_var("TAGSIDE_REGION", "us-east-1");

        let from_env = Context::from_str(&minimal()).unwrap();
        assert_eq!(from_env.aws.account().as_deref(), Some("999999999999"));
        assert_eq!(from_env.aws.region().as_deref(), Some("us-east-1"));

        let toml = minimal() + "[aws]\naccount = \"111111111111\"\nregion = \"eu-west-1\"\n";
        let from_file = Context::from_str(&toml).unwrap();
        assert_eq!(from_file.aws.account().as_deref(), Some("111111111111"));
        assert_eq!(from_file.aws.region().as_deref(), Some("eu-west-1"));

        std::env::remove_var("TAGSIDE_ACCOUNT");
        std::env::remove_var("TAGSIDE_REGION");
    }

    #[test]
    fn accepts_producer_ingestion() {
        let toml = minimal()
            + r#"
                topology = "dual-lb"
                ingestion = "producer-service"
                producer_dns = "collect.example.com"
                producer_image = "111111111111.dkr.ecr.eu-west-1.amazonaws.com/producer:latest"
            "#;

        let context = Context::from_str(&toml).unwrap();
        assert_eq!(context.producer_dns().unwrap(), "collect.example.com");
    }
}
