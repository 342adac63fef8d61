//! Stackform CLI entrypoint.
//!
//! This is the main entrypoint for the stackform command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stackform::cli::{Cli, Commands, OutputFormatter};
use stackform::config::{
    ConfigParser, ConfigValidator, StackformConfig, WaitConfig, find_config_file, load_sdk_config,
};
use stackform::error::{ConfigError, Result, StackformError};
use stackform::pipeline::{CodePipelineLister, PipelineStateLister, RevisionLocator};
use stackform::stack::{
    CloudFormationBackend, ParameterSet, RecordingObserver, StackUpserter, Tee, TracingObserver,
};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let context = Context::load(cli.config.as_ref())?;

    match cli.command {
        Commands::Upsert {
            stack,
            template,
            params,
        } => cmd_upsert(&context, stack, template, &params, &formatter).await,
        Commands::Status { stack } => cmd_status(&context, stack, &formatter).await,
        Commands::Revision {
            pipeline,
            source_action,
        } => cmd_revision(&context, pipeline, source_action, &formatter).await,
        Commands::Stages { pipeline } => cmd_stages(&context, pipeline, &formatter).await,
    }
}

/// Create or update the stack.
async fn cmd_upsert(
    context: &Context,
    stack: Option<String>,
    template: Option<PathBuf>,
    params: &[String],
    formatter: &OutputFormatter,
) -> Result<()> {
    let stack_name = context.stack_name(stack)?;
    let template_path = match (template, context.config.as_ref()) {
        (Some(path), _) => path,
        (None, Some(config)) => context.parser.resolve_path(&config.stack.template),
        (None, None) => return Err(missing("stack.template")),
    };

    let mut parameters = context
        .config
        .as_ref()
        .map(|config| config.stack.parameters.clone())
        .unwrap_or_default();
    parameters.merge(ParameterSet::from_assignments(params)?);

    info!(
        "Reconciling stack {stack_name} from {}",
        template_path.display()
    );
    let mut template = tokio::fs::File::open(&template_path).await?;

    let backend = context.backend().await;
    let recorder = RecordingObserver::new();
    let observer = Tee::new(&TracingObserver, &recorder);
    let upserter = StackUpserter::new(&backend)
        .with_observer(&observer)
        .with_max_rounds(context.waits().max_rounds);

    let outcome = upserter
        .upsert_reader(&stack_name, &mut template, &parameters)
        .await?;

    print!(
        "{}",
        formatter.format_upsert(&stack_name, outcome, &recorder.events())?
    );
    Ok(())
}

/// Resolve the settled status of the stack.
async fn cmd_status(
    context: &Context,
    stack: Option<String>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let stack_name = context.stack_name(stack)?;
    let backend = context.backend().await;
    let upserter = StackUpserter::new(&backend).with_max_rounds(context.waits().max_rounds);

    let status = upserter.resolver().resolve(&stack_name).await?;

    print!("{}", formatter.format_status(&stack_name, &status)?);
    Ok(())
}

/// Show the source revision of a pipeline.
async fn cmd_revision(
    context: &Context,
    pipeline: Option<String>,
    source_action: Option<String>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let pipeline_name = context.pipeline_name(pipeline)?;
    let source_action = source_action
        .or_else(|| {
            context
                .config
                .as_ref()
                .and_then(|config| config.pipeline.as_ref())
                .map(|pipeline| pipeline.source_action.clone())
        });

    let lister = context.lister().await;
    let mut locator = RevisionLocator::new(&lister);
    if let Some(action) = source_action {
        locator = locator.with_source_action(action);
    }

    let revision = locator.source_revision(&pipeline_name).await?;

    print!("{}", formatter.format_revision(&pipeline_name, &revision)?);
    Ok(())
}

/// Show the stage states of a pipeline.
async fn cmd_stages(
    context: &Context,
    pipeline: Option<String>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let pipeline_name = context.pipeline_name(pipeline)?;
    let lister = context.lister().await;

    let stages = lister.list_state(&pipeline_name).await?;

    print!("{}", formatter.format_stages(&pipeline_name, &stages)?);
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Configuration shared by all commands.
struct Context {
    parser: ConfigParser,
    config: Option<StackformConfig>,
}

impl Context {
    /// Loads the configuration file.
    ///
    /// An explicit path must exist. Without one, the file is searched for
    /// upward from the working directory and commands fall back to their
    /// arguments when none is found.
    fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => Some(path.clone()),
            None => find_config_file(".").ok(),
        };

        let Some(config_file) = config_file else {
            debug!("No configuration file found, using command arguments only");
            let parser = ConfigParser::new();
            parser.load_dotenv()?;
            return Ok(Self {
                parser,
                config: None,
            });
        };

        debug!("Loading configuration from: {}", config_file.display());
        let parser = ConfigParser::new()
            .with_base_path(config_file.parent().unwrap_or_else(|| Path::new(".")));
        parser.load_dotenv()?;

        let config = parser.load_with_env(&config_file)?;
        let validation = ConfigValidator::new().validate(&config)?;
        for warning in &validation.warnings {
            debug!("Configuration warning: {warning}");
        }

        Ok(Self {
            parser,
            config: Some(config),
        })
    }

    fn stack_name(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .or_else(|| self.config.as_ref().map(|config| config.stack.name.clone()))
            .ok_or_else(|| missing("stack.name"))
    }

    fn pipeline_name(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .or_else(|| {
                self.config
                    .as_ref()
                    .and_then(|config| config.pipeline.as_ref())
                    .map(|pipeline| pipeline.name.clone())
            })
            .ok_or_else(|| missing("pipeline.name"))
    }

    fn waits(&self) -> WaitConfig {
        self.config
            .as_ref()
            .map(|config| config.waits)
            .unwrap_or_default()
    }

    fn region(&self) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|config| config.region.as_deref())
    }

    async fn backend(&self) -> CloudFormationBackend {
        let sdk_config = load_sdk_config(self.region()).await;
        CloudFormationBackend::new(&sdk_config, self.waits())
    }

    async fn lister(&self) -> CodePipelineLister {
        let sdk_config = load_sdk_config(self.region()).await;
        CodePipelineLister::new(&sdk_config)
    }
}

/// Builds the error for a value that is neither configured nor passed.
fn missing(name: &str) -> StackformError {
    StackformError::Config(ConfigError::MissingValue {
        name: name.to_string(),
    })
}
