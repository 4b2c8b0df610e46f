use crate::batch::BatchConverter;
use crate::detect::{detect_plugins, detect_theme, ThemeInfo, ThemeOptions};
use crate::fetch::{page_source, PageSource};
use crate::history::PasswordHistory;
use crate::pipeline::{ToolSlot, ToolState};
use crate::presenter::{
    copy_to_clipboard, download, download_all, progress_line, GeneratedPassword, Presenter,
};
use crate::seo::{analyze_seo, SeoMode};
use crate::speed::measure_speed;
use crate::{generate_password, Config, ExtractedFact, OutputFormat, ToolError, ToolRequest};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "wp-toolkit")]
#[command(about = "Small WordPress utilities: passwords, plugin/theme detection, SEO, speed, image conversion")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Print Prometheus metrics after the command")]
    pub metrics: bool,

    #[arg(long, global = true, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, help = "User-Agent header for page fetches")]
    pub user_agent: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate passwords and manage the saved history
    Password {
        #[command(subcommand)]
        action: PasswordCommand,
    },

    /// Detect WordPress plugins referenced by a page
    Plugins {
        #[arg(help = "Site URL (https:// is assumed when missing)")]
        url: String,
    },

    /// Detect the active WordPress theme
    Theme {
        #[arg(help = "Site URL (https:// is assumed when missing)")]
        url: String,

        #[arg(long, help = "Do not fetch the theme's style.css header")]
        no_stylesheet: bool,
    },

    /// Run an SEO checklist against a site
    Seo {
        #[arg(help = "Site URL (https:// is assumed when missing)")]
        url: String,

        #[arg(long, default_value = "checklist", help = "Analysis mode (checklist, html)")]
        mode: String,

        #[arg(long, help = "Fetch through the configured proxy endpoint")]
        proxy: bool,
    },

    /// Measure response time and estimate a speed score
    Speed {
        #[arg(help = "Site URL (https:// is assumed when missing)")]
        url: String,
    },

    /// Convert images to WebP (or JPEG/PNG)
    Convert(ConvertOptions),

    /// Validate configuration
    Validate {
        #[arg(short, long, help = "Configuration file to validate")]
        config: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PasswordCommand {
    /// Generate a new password
    Generate(GenerateOptions),

    /// List, remove or clear saved passwords
    History {
        #[arg(long, help = "Remove the entry at this position")]
        remove: Option<usize>,

        #[arg(long, help = "Delete every saved password")]
        clear: bool,

        #[arg(long, help = "Copy the entry at this position to the clipboard")]
        copy: Option<usize>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateOptions {
    #[arg(short, long, help = "Password length (8-64)")]
    pub length: Option<usize>,

    #[arg(long, help = "Exclude uppercase letters")]
    pub no_uppercase: bool,

    #[arg(long, help = "Exclude lowercase letters")]
    pub no_lowercase: bool,

    #[arg(long, help = "Exclude numbers")]
    pub no_numbers: bool,

    #[arg(long, help = "Exclude symbols")]
    pub no_symbols: bool,

    #[arg(long, help = "Do not record the password in history")]
    pub no_save: bool,

    #[arg(long, help = "Copy the password to the clipboard")]
    pub copy: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertOptions {
    #[arg(required = true, help = "Image files to convert")]
    pub files: Vec<PathBuf>,

    #[arg(short, long, help = "Directory to save converted images into")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Output format (webp, jpeg, png)")]
    pub format: Option<String>,

    #[arg(long, requires = "output", help = "Save only the n-th converted image (1-based)")]
    pub pick: Option<usize>,
}

/// One slot per tool; a tool cannot be re-entered while it is running.
struct Slots {
    password: ToolSlot,
    plugins: ToolSlot,
    theme: ToolSlot,
    seo: ToolSlot,
    speed: ToolSlot,
    convert: ToolSlot,
}

impl Slots {
    const fn new() -> Self {
        Self {
            password: ToolSlot::new("password"),
            plugins: ToolSlot::new("plugins"),
            theme: ToolSlot::new("theme"),
            seo: ToolSlot::new("seo"),
            speed: ToolSlot::new("speed"),
            convert: ToolSlot::new("convert"),
        }
    }
}

pub struct CliRunner {
    pub config: Config,
    pub presenter: Presenter,
    source: Box<dyn PageSource>,
    slots: Slots,
}

impl CliRunner {
    pub fn new(config: Config, args: &Cli) -> Result<Self, ToolError> {
        let source = page_source(&config, false)?;
        Ok(Self::with_source(config, Presenter::new(args.json), source))
    }

    /// Builds a runner around an existing page source.
    pub fn with_source(config: Config, presenter: Presenter, source: Box<dyn PageSource>) -> Self {
        Self {
            config,
            presenter,
            source,
            slots: Slots::new(),
        }
    }

    /// Runs `command` and prints its result.
    ///
    /// The theme detector prints its manual-detection placeholder before
    /// returning a network error.
    pub async fn run(&self, command: Commands) -> Result<(), ToolError> {
        let output = match command {
            Commands::Password { action } => match action {
                PasswordCommand::Generate(options) => self.run_generate(options).await?,
                PasswordCommand::History {
                    remove,
                    clear,
                    copy,
                } => self.run_history(remove, clear, copy).await?,
            },
            Commands::Plugins { url } => self.run_plugins(&url).await?,
            Commands::Theme { url, no_stylesheet } => {
                match self.run_theme_or_placeholder(&url, !no_stylesheet).await {
                    Ok(output) => output,
                    Err((placeholder, e)) => {
                        if let Some(placeholder) = placeholder {
                            println!("{}", placeholder.trim_end());
                        }
                        return Err(e);
                    }
                }
            }
            Commands::Seo { url, mode, proxy } => {
                let mode: SeoMode = mode.parse()?;
                self.run_seo(&url, mode, proxy).await?
            }
            Commands::Speed { url } => self.run_speed(&url).await?,
            Commands::Convert(options) => self.run_convert(options).await?,
            Commands::Validate { config } => self.validate_config(config).await?,
        };

        println!("{}", output.trim_end());
        Ok(())
    }

    fn history(&self) -> Result<PasswordHistory, ToolError> {
        self.config
            .history_path()
            .map(PasswordHistory::new)
            .ok_or_else(|| {
                ToolError::ConfigurationError(
                    "no history_path configured and $HOME is not set".to_string(),
                )
            })
    }

    /// Reports a failed clipboard copy once; the tool result still stands.
    async fn copy_once(&self, text: &str) {
        match copy_to_clipboard(text).await {
            Ok(()) => info!("Copied to clipboard"),
            Err(e) => eprintln!("{}", self.presenter.format_error(&e)),
        }
    }

    /// Records `password` in history. A failure is reported on stderr and the
    /// password is still shown.
    fn save_once(&self, password: &str) -> bool {
        match self.history().and_then(|history| history.record(password)) {
            Ok(_) => true,
            Err(e) => {
                warn!("Password was not saved to history: {}", e);
                eprintln!("{}", self.presenter.format_error(&e));
                false
            }
        }
    }

    fn log_facts(&self, tool: &str, facts: &[ExtractedFact]) {
        for fact in facts {
            debug!("{}: {} = {} ({:?})", tool, fact.key, fact.value, fact.confidence);
        }
    }

    pub async fn run_generate(&self, options: GenerateOptions) -> Result<String, ToolError> {
        let mut invocation = self.slots.password.try_begin()?;
        invocation.advance(ToolState::Validating);

        let mut password_options = self.config.password.clone();
        if let Some(length) = options.length {
            password_options.length = length;
        }
        password_options.uppercase &= !options.no_uppercase;
        password_options.lowercase &= !options.no_lowercase;
        password_options.numbers &= !options.no_numbers;
        password_options.symbols &= !options.no_symbols;

        let password = generate_password(&password_options).map_err(|e| invocation.fail(e))?;
        invocation.advance(ToolState::Reporting);

        let saved = if self.config.save_history && !options.no_save {
            self.save_once(&password)
        } else {
            false
        };

        if options.copy {
            self.copy_once(&password).await;
        }

        self.presenter.format(&GeneratedPassword {
            length: password.chars().count(),
            password,
            saved,
        })
    }

    pub async fn run_history(
        &self,
        remove: Option<usize>,
        clear: bool,
        copy: Option<usize>,
    ) -> Result<String, ToolError> {
        let history = self.history()?;

        if clear {
            let removed = history.clear()?;
            info!("Cleared {} saved password(s)", removed);
        } else if let Some(index) = remove {
            let removed = history.remove(index)?;
            debug!("Removed password saved at {}", removed.timestamp);
        }

        let entries = history.load()?;
        if let Some(index) = copy {
            let entry = entries.get(index).ok_or_else(|| {
                ToolError::InvalidInput(format!("no saved password at position {index}"))
            })?;
            self.copy_once(&entry.password).await;
        }

        self.presenter.format(entries.as_slice())
    }

    pub async fn run_plugins(&self, url: &str) -> Result<String, ToolError> {
        let request = ToolRequest::new(url);
        debug!("plugins request {}", request.id);

        let mut invocation = self.slots.plugins.try_begin()?;
        let detection =
            detect_plugins(&mut invocation, self.source.as_ref(), &request.raw_input).await?;
        self.log_facts("plugins", &detection.facts());
        self.presenter.format(&detection)
    }

    pub async fn run_theme(&self, url: &str, fetch_stylesheet: bool) -> Result<String, ToolError> {
        let request = ToolRequest::new(url);
        debug!("theme request {}", request.id);

        let mut invocation = self.slots.theme.try_begin()?;
        let theme = detect_theme(
            &mut invocation,
            self.source.as_ref(),
            &request.raw_input,
            ThemeOptions { fetch_stylesheet },
        )
        .await?;
        self.log_facts("theme", &theme.facts());
        self.presenter.format(&theme)
    }

    /// Like [`run_theme`](Self::run_theme), but a network error also carries
    /// the rendered manual-detection placeholder.
    pub async fn run_theme_or_placeholder(
        &self,
        url: &str,
        fetch_stylesheet: bool,
    ) -> Result<String, (Option<String>, ToolError)> {
        match self.run_theme(url, fetch_stylesheet).await {
            Ok(output) => Ok(output),
            Err(e @ ToolError::NetworkError(_)) => {
                let placeholder = self.presenter.format(&ThemeInfo::manual_detection()).ok();
                Err((placeholder, e))
            }
            Err(e) => Err((None, e)),
        }
    }

    pub async fn run_seo(&self, url: &str, mode: SeoMode, proxy: bool) -> Result<String, ToolError> {
        let request = ToolRequest::new(url);
        debug!("seo request {} ({:?})", request.id, mode);

        let mut invocation = self.slots.seo.try_begin()?;
        let analysis = if proxy {
            let source = page_source(&self.config, true)?;
            analyze_seo(&mut invocation, source.as_ref(), &request.raw_input, mode).await?
        } else {
            analyze_seo(&mut invocation, self.source.as_ref(), &request.raw_input, mode).await?
        };
        if let Some(signals) = &analysis.signals {
            self.log_facts("seo", &signals.facts());
        }
        self.presenter.format(&analysis)
    }

    pub async fn run_speed(&self, url: &str) -> Result<String, ToolError> {
        let request = ToolRequest::new(url);
        debug!("speed request {}", request.id);

        let mut invocation = self.slots.speed.try_begin()?;
        let report = measure_speed(&mut invocation, self.source.as_ref(), &request.raw_input).await?;
        self.log_facts("speed", &report.facts());
        self.presenter.format(&report)
    }

    pub async fn run_convert(&self, options: ConvertOptions) -> Result<String, ToolError> {
        let format = match &options.format {
            Some(format) => format.parse::<OutputFormat>()?,
            None => self.config.output_format,
        };

        let mut invocation = self.slots.convert.try_begin()?;
        let show_progress = !self.presenter.json;
        let outcome = BatchConverter::new(format)
            .convert_all(&mut invocation, options.files, |progress| {
                if show_progress {
                    eprintln!("{}", progress_line(progress));
                }
            })
            .await?;

        if let Some(dir) = &options.output {
            match options.pick {
                Some(n) => {
                    let image = n
                        .checked_sub(1)
                        .and_then(|i| outcome.converted.get(i))
                        .ok_or_else(|| {
                            ToolError::InvalidInput(format!(
                                "--pick {n} is out of range (1-{})",
                                outcome.converted.len()
                            ))
                        })?;
                    download(dir, image).await?;
                }
                None => {
                    let written = download_all(dir, &outcome.converted).await?;
                    info!("Saved {} file(s) to {}", written.len(), dir.display());
                }
            }
        } else if !outcome.converted.is_empty() {
            warn!("No --output directory given, converted images were not saved");
        }

        if outcome.converted.is_empty() && !outcome.failures.is_empty() {
            let (path, error) = &outcome.failures[0];
            warn!("Every image failed to convert, first failure: {}", path.display());
            return Err(error.clone());
        }

        self.presenter.format(&outcome)
    }

    pub async fn validate_config(&self, config_path: PathBuf) -> Result<String, ToolError> {
        let config_content = fs::read_to_string(&config_path).await?;
        let config: Config = serde_json::from_str(&config_content)?;
        crate::validate_config(&config)?;

        Ok(format!(
            "Configuration is valid: {}\n  Request timeout: {}\n  Proxy endpoint: {}\n  Save history: {}\n  Password length: {}\n  Output format: {}",
            config_path.display(),
            config
                .request_timeout_secs
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "none".to_string()),
            config.proxy_endpoint.as_deref().unwrap_or("none"),
            config.save_history,
            config.password.length,
            config.output_format.extension()
        ))
    }
}

pub fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
