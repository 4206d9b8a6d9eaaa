use aws_config::BehaviorVersion;
use aws_sdk_cloudformation::types::{Capability, StackEvent};
use eyre::{ContextCompat, WrapErr};
use std::time::Duration;
use tagside_stacks::Template;

/// Thin wrapper around the CloudFormation client
///
/// Owns provisioning, polling and teardown of a synthesized stack. All
/// rollback semantics belong to CloudFormation itself, nothing is retried
/// here.
pub(crate) struct StackClient {
    config: aws_config::SdkConfig,
    client: aws_sdk_cloudformation::Client,
}

impl StackClient {
    pub(crate) async fn new(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::v2025_01_17());

        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }

        let config = loader.load().await;
        let client = aws_sdk_cloudformation::Client::new(&config);

        StackClient { config, client }
    }

    /// AWS account ID of the active credentials
    pub(crate) async fn account_id(&self) -> eyre::Result<String> {
        let sts_client = aws_sdk_sts::Client::new(&self.config);
        let identity = sts_client
            .get_caller_identity()
            .send()
            .await
            .wrap_err("Failed to resolve caller identity")?;

        Ok(identity
            .account()
            .wrap_err("Failed to get AWS account ID")?
            .to_string())
    }

    /// Check if the stack already exists
    async fn is_exists(&self, name: &str) -> eyre::Result<bool> {
        let result = self
            .client
            .describe_stacks()
            .set_stack_name(Some(name.into()))
            .send()
            .await;

        if let Err(e) = &result {
            if let aws_sdk_cloudformation::error::SdkError::ServiceError(err) = e {
                if err.err().meta().code().unwrap_or_default().eq("ValidationError") {
                    return Ok(false);
                }

                return Err(eyre::eyre!("Service error while describing stack: {err:?}"));
            }

            return Err(eyre::eyre!("Failed to describe stack: {e:?}"));
        }

        Ok(true)
    }

    /// Provision the template in CloudFormation, creating or updating
    pub(crate) async fn provision(&self, template: &Template) -> eyre::Result<()> {
        let name = template.stack_name();
        let capabilities = Capability::CapabilityIam;
        let template_string = template.to_json_pretty()?;

        if self.is_exists(name).await? {
            let result = self
                .client
                .update_stack()
                .capabilities(capabilities)
                .stack_name(name)
                .template_body(template_string)
                .send()
                .await;

            // An update with an unchanged template is not a failure
            if let Err(aws_sdk_cloudformation::error::SdkError::ServiceError(err)) = &result {
                let message = err.err().meta().message().unwrap_or_default();

                if message.contains("No updates are to be performed") {
                    log::info!("Stack {name} is already up to date");
                    return Ok(());
                }
            }

            result.wrap_err("Failed to update stack")?;
        } else {
            self.client
                .create_stack()
                .capabilities(capabilities)
                .stack_name(name)
                .template_body(template_string)
                .send()
                .await
                .wrap_err("Failed to create stack")?;
        }

        Ok(())
    }

    /// Poll the stack until it reaches a terminal status
    ///
    /// Returns the final status string, or an error for rollback and
    /// failure statuses.
    pub(crate) async fn wait(&self, name: &str) -> eyre::Result<String> {
        loop {
            let response = self
                .client
                .describe_stacks()
                .stack_name(name)
                .send()
                .await
                .wrap_err("Failed to describe stack")?;

            let status = response
                .stacks()
                .first()
                .wrap_err("No such stack")?
                .stack_status()
                .wrap_err("Missing stack status")?
                .as_str()
                .to_string();

            match status.as_str() {
                "CREATE_COMPLETE" | "UPDATE_COMPLETE" => return Ok(status),

                "CREATE_FAILED"
                | "UPDATE_FAILED"
                | "ROLLBACK_COMPLETE"
                | "ROLLBACK_FAILED"
                | "UPDATE_ROLLBACK_COMPLETE"
                | "UPDATE_ROLLBACK_FAILED"
                | "DELETE_FAILED" => {
                    return Err(eyre::eyre!("Stack {name} ended up in {status}"));
                }

                _ => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        }
    }

    pub(crate) async fn destroy(&self, name: &str) -> eyre::Result<()> {
        self.client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .wrap_err_with(|| format!("Failed to delete stack {name}"))?;

        Ok(())
    }

    /// Poll until the stack is gone
    pub(crate) async fn wait_deleted(&self, name: &str) -> eyre::Result<()> {
        loop {
            if !self.is_exists(name).await? {
                return Ok(());
            }

            let response = self.client.describe_stacks().stack_name(name).send().await;

            // DescribeStacks fails with ValidationError once deletion finished
            let Ok(response) = response else {
                return Ok(());
            };

            let status = response
                .stacks()
                .first()
                .and_then(|s| s.stack_status())
                .map(|s| s.as_str().to_string())
                .unwrap_or_default();

            if status == "DELETE_COMPLETE" {
                return Ok(());
            }

            if status == "DELETE_FAILED" {
                return Err(eyre::eyre!("Stack {name} ended up in DELETE_FAILED"));
            }

            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    /// Most recent stack events, newest first
    pub(crate) async fn events(&self, name: &str, limit: usize) -> eyre::Result<Vec<StackEvent>> {
        if !self.is_exists(name).await? {
            return Ok(vec![]);
        }

        let response = self
            .client
            .describe_stack_events()
            .stack_name(name)
            .send()
            .await
            .wrap_err("Failed to describe stack events")?;

        Ok(response.stack_events().iter().take(limit).cloned().collect())
    }
}
