use crate::cloudformation::StackClient;
use std::path::PathBuf;
use tagside_stacks::{analytics, tagging, Context};

#[derive(clap::Args, Clone)]
pub struct StatusCommand {
    /// Directory containing tagside.toml
    #[arg(short, long, default_value = ".")]
    context: PathBuf,

    /// Number of events to show per stack
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
}

impl StatusCommand {
    pub async fn run(&self) -> eyre::Result<()> {
        let context = Context::from_dir(&self.context)?;
        let client = StackClient::new(context.aws.region()).await;

        for name in [tagging::STACK_NAME, analytics::STACK_NAME] {
            println!("{}", console::style(name).bold());

            let events = client.events(name, self.limit).await?;

            if events.is_empty() {
                println!("  {}", console::style("not deployed").dim());
                continue;
            }

            for event in events {
                let status = event.resource_status().map(|s| s.as_str()).unwrap_or("-");

                let status = if status.contains("FAILED") {
                    console::style(status).red()
                } else if status.ends_with("COMPLETE") {
                    console::style(status).green()
                } else {
                    console::style(status).yellow()
                };

                println!(
                    "  {} {} {} {}",
                    console::style(
                        event
                            .timestamp()
                            .map(|t| t.to_string())
                            .unwrap_or_default()
                    )
                    .dim(),
                    status,
                    event.resource_type().unwrap_or("-"),
                    console::style(event.resource_status_reason().unwrap_or("")).dim()
                );
            }
        }

        Ok(())
    }
}
