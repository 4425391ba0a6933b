//! Command-line front end.
//!
//! Parses arguments with clap, layers the configuration, builds an
//! [`OpsManagerClient`] and prints every result as pretty JSON on stdout.
//! Diagnostics go to stderr through `tracing`.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use serde::Serialize;

use crate::client::OpsManagerClient;
use crate::config::Config;
use crate::models::{AgentType, User};
use crate::transport::HttpTransport;

/// Command-line client for the MongoDB Ops Manager public API
#[derive(Parser, Debug)]
#[command(name = "opsman")]
#[command(version, about = "Command-line client for the MongoDB Ops Manager public API", long_about = None)]
pub struct Cli {
    /// Config file path (default: <config dir>/opsman/config.toml)
    #[arg(long, global = true, env = "OPSMAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ops Manager base URL (overrides config file and environment)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Programmatic API public key
    #[arg(long, global = true)]
    pub public_key: Option<String>,

    /// Programmatic API private key
    #[arg(long, global = true)]
    pub private_key: Option<String>,

    /// Public API path prefix
    #[arg(long, global = true)]
    pub api_prefix: Option<String>,

    /// Global request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Prompt for connection settings and save them
    Configure,

    /// Project management commands
    #[command(visible_alias = "groups")]
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Automation configuration commands
    Automation {
        #[command(subcommand)]
        command: AutomationCommands,
    },

    /// Monitored host commands
    Hosts {
        #[command(subcommand)]
        command: HostCommands,
    },

    /// Agent commands
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Backup commands
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },

    /// User commands
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

/// Project selector shared by project-scoped commands.
#[derive(Args, Debug, Clone)]
pub(crate) struct ProjectArg {
    /// Project identifier
    #[arg(long = "project-id", visible_alias = "group-id")]
    pub(crate) project_id: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ProjectCommands {
    /// List all projects
    List,

    /// Show a project by identifier
    Get {
        /// Project identifier
        id: String,
    },

    /// Show a project by name
    GetByName {
        /// Project name
        name: String,
    },

    /// Create a project
    Create {
        /// Project name
        name: String,

        /// Organization to create the project in
        #[arg(long)]
        org_id: Option<String>,
    },

    /// Delete a project
    Delete {
        /// Project identifier
        id: String,
    },

    /// Replace the tags of a project
    Tags {
        /// Project identifier
        id: String,

        /// Tag to set (repeatable; none clears all tags)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum AutomationCommands {
    /// Show goal-state progress
    Status(ProjectArg),

    /// Show the automation configuration
    Retrieve(ProjectArg),

    /// Show the configuration as served to automation agents
    Raw(ProjectArg),

    /// Replace the automation configuration with a JSON document
    Update {
        #[command(flatten)]
        project: ProjectArg,

        /// JSON file holding the new configuration
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum HostCommands {
    /// List monitored hosts
    List(ProjectArg),
}

#[derive(Subcommand, Debug)]
pub(crate) enum AgentCommands {
    /// List agents of one type
    List {
        #[command(flatten)]
        project: ProjectArg,

        /// Agent type: monitoring, backup or automation
        #[arg(long = "type")]
        agent_type: AgentType,
    },

    /// Create an agent API key
    CreateKey {
        #[command(flatten)]
        project: ProjectArg,

        /// Key description
        #[arg(long)]
        desc: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum BackupCommands {
    /// List backup configurations
    Configs(ProjectArg),
}

#[derive(Subcommand, Debug)]
pub(crate) enum UserCommands {
    /// Register the first user of a fresh installation
    CreateFirst {
        /// Login name
        #[arg(long)]
        username: String,

        /// Initial password
        #[arg(long)]
        password: String,

        /// Given name
        #[arg(long)]
        first_name: String,

        /// Family name
        #[arg(long)]
        last_name: String,

        /// Contact address
        #[arg(long)]
        email: Option<String>,

        /// IP allow-list entry for the issued API key (e.g. 0.0.0.0/0)
        #[arg(long)]
        whitelist: Option<String>,
    },
}

impl Cli {
    /// Returns the default log filter for the requested verbosity.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "opsman=warn",
            1 => "opsman=debug",
            _ => "opsman=trace",
        }
    }

    /// Loads the configuration and applies command-line overrides.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(public_key) = &self.public_key {
            config.public_key = public_key.clone();
        }
        if let Some(private_key) = &self.private_key {
            config.private_key = private_key.clone();
        }
        if let Some(api_prefix) = &self.api_prefix {
            config.api_prefix = api_prefix.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }

        config.validate().context("Invalid configuration")?;
        tracing::debug!(?config, "Configuration resolved");
        Ok(config)
    }

    fn config_path(&self) -> Result<PathBuf> {
        self.config
            .clone()
            .or_else(Config::default_path)
            .context("No config directory on this platform; pass --config")
    }
}

/// Runs the parsed command.
///
/// # Errors
///
/// Returns any configuration, network or API failure with context attached.
pub async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Configure => configure(&cli),
        Commands::Projects { command } => run_projects(&connect(&cli, true)?, command).await,
        Commands::Automation { command } => run_automation(&connect(&cli, true)?, command).await,
        Commands::Hosts { command } => run_hosts(&connect(&cli, true)?, command).await,
        Commands::Agents { command } => run_agents(&connect(&cli, true)?, command).await,
        Commands::Backup { command } => run_backup(&connect(&cli, true)?, command).await,
        // The first user is registered before any API key exists.
        Commands::Users { command } => run_users(&connect(&cli, false)?, command).await,
    }
}

fn connect(cli: &Cli, authenticated: bool) -> Result<OpsManagerClient> {
    let config = cli.resolve_config()?;
    build_client(&config, authenticated)
}

/// Builds a client; `authenticated` requires both API keys.
fn build_client(config: &Config, authenticated: bool) -> Result<OpsManagerClient> {
    let resolver = config.resolver()?;
    let mut transport = HttpTransport::builder().timeouts(config.timeouts());

    if authenticated {
        if !config.has_credentials() {
            bail!(
                "API keys are not set; run `opsman configure` or set OPSMAN_PUBLIC_KEY and OPSMAN_PRIVATE_KEY"
            );
        }
        transport = transport.digest_auth(&config.public_key, &config.private_key);
    }

    let client = OpsManagerClient::builder()
        .resolver(resolver)
        .transport(transport.build().context("Failed to create HTTP transport")?)
        .build()?;
    Ok(client)
}

fn configure(cli: &Cli) -> Result<()> {
    let path = cli.config_path()?;
    let current = Config::from_file(&path)?;
    let theme = ColorfulTheme::default();

    let base_url: String = Input::with_theme(&theme)
        .with_prompt("Ops Manager base URL")
        .with_initial_text(current.base_url.clone())
        .validate_with(|input: &String| {
            Config::validate_base_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .context("Failed to read base URL")?;

    let public_key: String = Input::with_theme(&theme)
        .with_prompt("Public key")
        .with_initial_text(current.public_key.clone())
        .interact_text()
        .context("Failed to read public key")?;

    let private_key = Password::with_theme(&theme)
        .with_prompt("Private key")
        .interact()
        .context("Failed to read private key")?;

    let config = Config {
        base_url: Config::validate_base_url(&base_url)?,
        public_key,
        private_key,
        ..current
    };
    config.save(&path)?;

    eprintln!("Configuration saved to {}", path.display());
    Ok(())
}

async fn run_projects(client: &OpsManagerClient, command: &ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::List => print_json(&client.get_all_projects().await?),
        ProjectCommands::Get { id } => print_json(&client.get_project_by_id(id).await?),
        ProjectCommands::GetByName { name } => {
            print_json(&client.get_project_by_name(name).await?)
        }
        ProjectCommands::Create { name, org_id } => {
            print_json(&client.create_project(name, org_id.as_deref()).await?)
        }
        ProjectCommands::Delete { id } => {
            client.delete_project(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        ProjectCommands::Tags { id, tags } => {
            print_json(&client.set_project_tags(id, tags).await?)
        }
    }
}

async fn run_automation(client: &OpsManagerClient, command: &AutomationCommands) -> Result<()> {
    match command {
        AutomationCommands::Status(project) => {
            print_json(&client.get_automation_status(&project.project_id).await?)
        }
        AutomationCommands::Retrieve(project) => {
            print_json(&client.get_automation_config(&project.project_id).await?)
        }
        AutomationCommands::Raw(project) => {
            print_json(&client.get_raw_automation_config(&project.project_id).await?)
        }
        AutomationCommands::Update { project, file } => {
            let contents = fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document: serde_json::Value = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            print_json(
                &client
                    .update_deployments(&project.project_id, &document)
                    .await?,
            )
        }
    }
}

async fn run_hosts(client: &OpsManagerClient, command: &HostCommands) -> Result<()> {
    match command {
        HostCommands::List(project) => print_json(&client.get_hosts(&project.project_id).await?),
    }
}

async fn run_agents(client: &OpsManagerClient, command: &AgentCommands) -> Result<()> {
    match command {
        AgentCommands::List {
            project,
            agent_type,
        } => print_json(
            &client
                .get_agents_by_type(&project.project_id, *agent_type)
                .await?,
        ),
        AgentCommands::CreateKey { project, desc } => {
            // The key is printed in full: this is the only time the server returns it.
            let key = client
                .create_agent_api_key(&project.project_id, desc)
                .await?;
            print_json(&key)
        }
    }
}

async fn run_backup(client: &OpsManagerClient, command: &BackupCommands) -> Result<()> {
    match command {
        BackupCommands::Configs(project) => {
            print_json(&client.get_backup_configs(&project.project_id).await?)
        }
    }
}

async fn run_users(client: &OpsManagerClient, command: &UserCommands) -> Result<()> {
    match command {
        UserCommands::CreateFirst {
            username,
            password,
            first_name,
            last_name,
            email,
            whitelist,
        } => {
            let user = User {
                username: username.clone(),
                password: Some(password.clone()),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                email_address: email.clone(),
            };
            print_json(&client.create_first_user(&user, whitelist.as_deref()).await?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", output);
    Ok(())
}
