use std::sync::OnceLock;

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

/// Routes `log` records through the shared progress area, so provisioning
/// spinners and log lines never interleave on the terminal.
///
/// Silent by default. Set TAGSIDE_LOG=info (or debug) to surface SDK and
/// provisioning logs.
pub struct Logger {
    multi_progress: MultiProgress,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

impl Logger {
    pub fn init() -> &'static Self {
        LOGGER.get_or_init(|| {
            let logger = env_logger::Builder::from_env(
                env_logger::Env::new().filter_or("TAGSIDE_LOG", "off"),
            )
            .build();

            let level = logger.filter();
            let multi_progress = MultiProgress::new();

            if LogWrapper::new(multi_progress.clone(), logger)
                .try_init()
                .is_ok()
            {
                log::set_max_level(level);
            }

            Logger { multi_progress }
        })
    }

    /// Progress area to attach spinners to
    pub fn multi_progress() -> &'static MultiProgress {
        &Self::init().multi_progress
    }
}
