pub mod deploy;
pub mod destroy;
pub mod status;
pub mod synth;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize CloudFormation templates and suppression lists
    Synth(synth::SynthCommand),

    /// Synthesize and provision both stacks in dependency order
    Deploy(deploy::DeployCommand),

    /// [DANGER] Delete both stacks
    Destroy(destroy::DestroyCommand),

    /// Show recent stack events
    Status(status::StatusCommand),
}
