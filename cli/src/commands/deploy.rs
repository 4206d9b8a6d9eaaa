use crate::cloudformation::StackClient;
use crate::commands::synth::synthesize;
use crate::logger::Logger;
use clap::ArgAction;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Duration;
use tagside_stacks::Context;

#[derive(clap::Args, Clone)]
pub struct DeployCommand {
    /// Directory containing tagside.toml
    #[arg(short, long, default_value = ".")]
    context: PathBuf,

    /// Do not wait for the stacks to reach a terminal state
    #[arg(long, action = ArgAction::SetTrue)]
    no_wait: bool,
}

impl DeployCommand {
    pub async fn run(&self) -> eyre::Result<()> {
        let context = Context::from_dir(&self.context)?;
        let artifacts = synthesize(&context)?;

        let client = StackClient::new(context.aws.region()).await;

        // Configured account if any, otherwise the active credentials
        let account_id = match context.aws.account() {
            Some(account) => account,
            None => client.account_id().await?,
        };

        println!(
            "Deploying {} stacks to account {}",
            artifacts.len(),
            console::style(&account_id).bold()
        );

        for artifact in artifacts {
            let name = artifact.template.stack_name().to_string();

            let spinner = Logger::multi_progress().add(ProgressBar::new_spinner());
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message(format!("Provisioning {name}"));

            client.provision(&artifact.template).await?;

            if !self.no_wait {
                let status = client.wait(&name).await?;
                spinner.finish_with_message(format!(
                    "{} {name} ({status})",
                    console::style("Deployed").green().bold()
                ));
            } else {
                spinner.finish_with_message(format!("Submitted {name}"));
            }
        }

        Ok(())
    }
}
