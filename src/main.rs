// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use nmtrans::app_config::{self, Config, EngineBackend};
use nmtrans::app_controller::Controller;

/// CLI Wrapper for EngineBackend to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEngineBackend {
    Easynmt,
    Ctranslate2,
}

impl From<CliEngineBackend> for EngineBackend {
    fn from(cli_backend: CliEngineBackend) -> Self {
        match cli_backend {
            CliEngineBackend::Easynmt => EngineBackend::EasyNmt,
            CliEngineBackend::Ctranslate2 => EngineBackend::CTranslate2,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate every .srt and .docx file of the input folder (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for nmtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
struct TranslateArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Folder holding the files to translate
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Scratch folder for translated Word documents (must be empty)
    #[arg(long)]
    intermediate_dir: Option<PathBuf>,

    /// Folder receiving the translated files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'de')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language codes, comma separated (e.g., 'fr,es')
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Engine backend
    #[arg(short, long, value_enum)]
    backend: Option<CliEngineBackend>,

    /// Verbosity: 0 errors, 1 warnings, 2-3 info, 4 debug, 5 trace
    #[arg(short, long)]
    verbosity: Option<u8>,

    /// Stop at the first failing file
    #[arg(long)]
    testing: bool,

    /// Convert translated Word documents to PDF
    #[arg(long)]
    pdf: bool,

    /// Load all models before translating
    #[arg(long)]
    preload: bool,
}

/// nmtrans - batch neural machine translation of subtitles and Word documents
#[derive(Parser, Debug)]
#[command(name = "nmtrans")]
#[command(version)]
#[command(about = "Batch translation of .srt and .docx files with NMT models")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "nmtrans translates every .srt and .docx file of a folder into one or more
languages using neural machine translation models.

EXAMPLES:
    nmtrans                                     # Translate using conf.json
    nmtrans -s en -t fr,es                      # English to French and Spanish
    nmtrans -i in/ -o out/ --pdf                # Custom folders, Word output as PDF
    nmtrans --testing -v 4                      # Stop at the first failure, debug logging
    nmtrans completions bash > nmtrans.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// @maps: Configured level to the log crate filter
fn level_filter(level: app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level is lowered once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "nmtrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

// @applies: Command line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, options: TranslateArgs) {
    if let Some(input) = options.input_dir {
        config.paths.input = input;
    }
    if let Some(intermediate) = options.intermediate_dir {
        config.paths.intermediate = intermediate;
    }
    if let Some(output) = options.output_dir {
        config.paths.output = output;
    }
    if let Some(source_lang) = options.source_language {
        config.source_language = source_lang;
    }
    if let Some(target_langs) = options.target_languages {
        config.target_languages = target_langs
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
    if let Some(backend) = options.backend {
        config.engine.backend = backend.into();
    }
    if let Some(verbosity) = options.verbosity {
        config.verbosity = verbosity;
    }
    config.testing_mode |= options.testing;
    config.convert_to_pdf |= options.pdf;
    config.preload_models |= options.preload;
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(verbosity) = options.verbosity {
        log::set_max_level(level_filter(app_config::LogLevel::from_verbosity(verbosity)));
    }

    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        info!("Default configuration written to {}", options.config_path);
    }

    apply_overrides(&mut config, options);

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(config.log_level()));

    info!(
        "Translating {} from {} into {} using {}",
        config.paths.input.display(),
        config.source_language,
        config.target_languages.join(", "),
        config.engine.backend.display_name()
    );

    let controller = Controller::with_config(config)?;
    match controller.run().await {
        Ok(summary) => {
            if summary.failed > 0 {
                error!("{} file(s) could not be translated", summary.failed);
            }
            Ok(())
        }
        Err(e) => {
            error!("Batch stopped: {:#}", e);
            Err(e)
        }
    }
}
