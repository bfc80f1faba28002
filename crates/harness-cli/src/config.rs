//! CLI configuration

use crate::commands::{BrowserArgs, Cli, ColorArg};
use crate::error::CliResult;
use demoqa_harness::HarnessConfig;
use serde::Serialize;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Verbosity {
    /// Quiet - errors and the summary only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Console log level this verbosity asks for, if it overrides `LOG_LEVEL`
    #[must_use]
    pub const fn log_level(self) -> Option<&'static str> {
        match self {
            Self::Quiet => Some("ERROR"),
            Self::Normal => None,
            Self::Verbose => Some("DEBUG"),
            Self::Debug => Some("TRACE"),
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Presentation settings taken from the global flags
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from the parsed global flags
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let verbosity = if cli.quiet {
            Verbosity::Quiet
        } else {
            match cli.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Debug,
            }
        };
        Self::new().with_verbosity(verbosity).with_color(cli.color.into())
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Apply the command-line overrides to an environment-loaded configuration
///
/// # Errors
///
/// Returns an error if `--browser` names an unsupported browser.
pub fn apply_overrides(
    mut config: HarnessConfig,
    args: &BrowserArgs,
    cli: &CliConfig,
) -> CliResult<HarnessConfig> {
    if let Some(headless) = args.headless_override() {
        config = config.with_headless(headless);
    }
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url.as_str());
    }
    if let Some(browser) = &args.browser {
        config.browser = browser.parse()?;
    }
    if let Some(level) = cli.verbosity.log_level() {
        config.log_level = level.to_string();
    }
    Ok(config)
}

/// Load the configuration from the environment and apply the overrides
///
/// # Errors
///
/// Returns an error if an environment variable or an override is invalid.
pub fn harness_config(args: &BrowserArgs, cli: &CliConfig) -> CliResult<HarnessConfig> {
    apply_overrides(HarnessConfig::from_env()?, args, cli)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use demoqa_harness::BrowserKind;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
            assert_eq!(Verbosity::Normal.log_level(), None);
        }

        #[test]
        fn test_levels() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(Verbosity::Debug.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
            assert_eq!(Verbosity::Quiet.log_level(), Some("ERROR"));
            assert_eq!(Verbosity::Verbose.log_level(), Some("DEBUG"));
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_fixed_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }

        #[test]
        fn test_from_arg() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_no_overrides_keep_environment() {
            let base = HarnessConfig::default().with_headless(true);
            let config = apply_overrides(base, &BrowserArgs::default(), &CliConfig::new()).unwrap();
            assert!(config.headless);
            assert_eq!(config.base_url, "https://demoqa.com");
            assert_eq!(config.log_level, HarnessConfig::default().log_level);
        }

        #[test]
        fn test_flags_override() {
            let args = BrowserArgs {
                headed: true,
                base_url: Some("http://localhost:3000/".into()),
                browser: Some("chromium".into()),
                ..BrowserArgs::default()
            };
            let cli = CliConfig::new().with_verbosity(Verbosity::Verbose);
            let config =
                apply_overrides(HarnessConfig::default().with_headless(true), &args, &cli).unwrap();
            assert!(!config.headless);
            assert_eq!(config.base_url, "http://localhost:3000");
            assert_eq!(config.browser, BrowserKind::Chromium);
            assert_eq!(config.log_level, "DEBUG");
        }

        #[test]
        fn test_firefox_rejected() {
            let args = BrowserArgs {
                browser: Some("firefox".into()),
                ..BrowserArgs::default()
            };
            let err =
                apply_overrides(HarnessConfig::default(), &args, &CliConfig::new()).unwrap_err();
            assert!(matches!(err, CliError::Harness(_)));
        }
    }
}
