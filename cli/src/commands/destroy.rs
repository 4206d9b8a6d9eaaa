use crate::cloudformation::StackClient;
use crate::logger::Logger;
use clap::ArgAction;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Duration;
use tagside_stacks::{analytics, tagging, Context};

#[derive(clap::Args, Clone)]
pub struct DestroyCommand {
    /// Directory containing tagside.toml
    #[arg(short, long, default_value = ".")]
    context: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long, action = ArgAction::SetTrue)]
    yes: bool,
}

impl DestroyCommand {
    pub async fn run(&self) -> eyre::Result<()> {
        let context = Context::from_dir(&self.context)?;

        if !self.yes {
            return Err(eyre::eyre!(
                "Destroy deletes both stacks and their data buckets, pass --yes to proceed"
            ));
        }

        let client = StackClient::new(context.aws.region()).await;

        // Reverse dependency order: imports must go before their exports
        for name in [analytics::STACK_NAME, tagging::STACK_NAME] {
            let spinner = Logger::multi_progress().add(ProgressBar::new_spinner());
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message(format!("Destroying {name}"));

            client.destroy(name).await?;
            client.wait_deleted(name).await?;

            spinner.finish_with_message(format!(
                "{} {name}",
                console::style("Destroyed").green().bold()
            ));
        }

        Ok(())
    }
}
