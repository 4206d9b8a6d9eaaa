use eyre::WrapErr;
use std::fs;
use std::path::PathBuf;
use tagside_stacks::suppressions::{self, Suppression};
use tagside_stacks::{AnalyticsStack, Context, TaggingStack, Template};

/// A synthesized stack with its accepted-finding list
pub(crate) struct StackArtifact {
    pub(crate) template: Template,
    pub(crate) suppressions: &'static [Suppression],
}

/// Synthesize both stacks in dependency order
///
/// The tagging stack comes first so its exports exist before the analytics
/// stack imports them.
pub(crate) fn synthesize(context: &Context) -> eyre::Result<Vec<StackArtifact>> {
    let (tagging, outputs) = TaggingStack::synth(context)?;
    let analytics = AnalyticsStack::synth(context, &outputs)?;

    Ok(vec![
        StackArtifact {
            template: tagging,
            suppressions: suppressions::TAGGING,
        },
        StackArtifact {
            template: analytics,
            suppressions: suppressions::ANALYTICS,
        },
    ])
}

#[derive(clap::Args, Clone)]
pub struct SynthCommand {
    /// Directory containing tagside.toml
    #[arg(short, long, default_value = ".")]
    context: PathBuf,

    /// Output directory for templates and suppression lists
    #[arg(short, long, default_value = "out")]
    out: PathBuf,
}

impl SynthCommand {
    pub fn run(&self) -> eyre::Result<()> {
        let context = Context::from_dir(&self.context)?;
        let artifacts = synthesize(&context)?;

        fs::create_dir_all(&self.out)
            .wrap_err_with(|| format!("Failed to create {:?}", self.out))?;

        for artifact in artifacts {
            let name = artifact.template.stack_name();

            let template_path = self.out.join(format!("{name}.template.json"));
            fs::write(&template_path, artifact.template.to_json_pretty()?)
                .wrap_err_with(|| format!("Failed to write {template_path:?}"))?;

            let nag_path = self.out.join(format!("{name}.nag.json"));
            fs::write(&nag_path, suppressions::to_json_pretty(artifact.suppressions)?)
                .wrap_err_with(|| format!("Failed to write {nag_path:?}"))?;

            println!(
                "{} {}",
                console::style("Synthesized").green().bold(),
                template_path.display()
            );
        }

        Ok(())
    }
}
