/// Terminal error message with an optional root-cause hint
#[derive(Debug)]
pub struct Error(String, Option<String>);

impl Error {
    pub fn new(message: &str, details: Option<&str>) -> Self {
        Error(message.to_string(), details.map(|d| d.to_string()))
    }
}

/// The styled block `main` prints before exiting non-zero
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\n{}", console::style("Error").red().bold(), self.0)?;

        if let Some(details) = &self.1 {
            write!(f, "\n\n{}", console::style(details).dim())?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

/// Split an eyre report into the top-level message and its root cause
impl From<eyre::ErrReport> for Error {
    fn from(error: eyre::ErrReport) -> Self {
        let message = error.to_string();
        let root = error.root_cause().to_string();

        if root == message {
            Error::new(&message, None)
        } else {
            Error::new(&message, Some(&root))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn renders_message_and_root_cause() {
        let report = Err::<(), _>(eyre::eyre!("disk full"))
            .wrap_err("Failed to write template")
            .unwrap_err();

        let rendered = Error::from(report).to_string();

        assert!(rendered.contains("Failed to write template"));
        assert!(rendered.contains("disk full"));
    }

    #[test]
    fn omits_details_without_a_distinct_cause() {
        let rendered = Error::from(eyre::eyre!("Failed to parse tagside.toml")).to_string();

        assert!(rendered.contains("Failed to parse tagside.toml"));
        assert!(!rendered.contains("\n\n"));
    }
}
