//! agentdesk CLI - command-line client for projects, agents and chat
//!
//! Each command first navigates to the view it stands for, so the same
//! session reconciliation and route guard apply as in any other front end.

use agentdesk_api::{ApiClients, WorkspaceApi, DEFAULT_AGENT_MODEL};
use agentdesk_client::{
    AgentForm, AuthActions, ChatTranscript, ClientError, FileSessionRecord, GuardDecision,
    LoginForm, Navigator, ProjectForm, RegisterForm, Route, SessionReconciler, SessionStore,
};
use agentdesk_core::{
    config_error, init_logging, log_operation_error, log_operation_start, log_operation_success,
    DeskConfig, DeskError, DeskResult, ErrorContext,
};
use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "agentdesk")]
#[command(about = "Manage projects and chat with their agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL, overriding configuration and AGENTDESK_API
    #[arg(long)]
    api: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an account and log in
    Register {
        /// Full name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Log out and forget local credentials
    Logout,

    /// Show who is logged in
    Whoami {
        /// Print the identity as JSON
        #[arg(long)]
        json: bool,
    },

    /// Navigate to a path and report what the client would show
    Open {
        /// Route path, e.g. /projects/42
        path: String,
    },

    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Manage the agents of a project
    Agents {
        #[command(subcommand)]
        action: AgentCommands,
    },

    /// Show an agent's chat or send it a message
    Chat {
        agent_id: String,

        /// Message to send
        #[arg(short, long)]
        message: Option<String>,

        /// Print messages as rendered HTML
        #[arg(long)]
        html: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List your projects
    List,

    /// Create a project
    Create {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List the agents of a project
    List { project_id: String },

    /// Attach a new agent to a project
    Create {
        project_id: String,

        name: String,

        #[arg(short, long, default_value = DEFAULT_AGENT_MODEL)]
        model: String,

        /// System prompt
        #[arg(short, long, default_value = "")]
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env_overrides();
    if let Some(api) = &cli.api {
        config.api.base_url = api.clone();
    }

    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    init_logging(&logging_config).map_err(|e| DeskError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check logging configuration"),
    })?;

    info!("Starting agentdesk CLI v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Config {
        show,
        init,
        validate,
    } = cli.command
    {
        return handle_config(&config, show, init, validate);
    }

    config.validate()?;
    let desk = Desk::open(&config)?;

    let result = match cli.command {
        Commands::Login { email, password } => handle_login(&desk, email, password).await,
        Commands::Register {
            name,
            email,
            password,
        } => handle_register(&desk, name, email, password).await,
        Commands::Logout => handle_logout(&desk).await,
        Commands::Whoami { json } => handle_whoami(&desk, json).await,
        Commands::Open { path } => handle_open(&desk, &path).await,
        Commands::Projects { action } => handle_projects(&desk, action).await,
        Commands::Agents { action } => handle_agents(&desk, action).await,
        Commands::Chat {
            agent_id,
            message,
            html,
        } => handle_chat(&desk, agent_id, message, html).await,
        Commands::Config { .. } => Ok(()),
    };

    desk.save_credentials();
    if let Err(e) = &result {
        report_failure(e);
    }
    result
}

/// Log API failures with their error id and hint at a retry when it may help
fn report_failure(error: &anyhow::Error) {
    let Some(desk_error) = error.downcast_ref::<DeskError>() else {
        return;
    };
    desk_error.log();
    if desk_error.is_recoverable() {
        eprintln!("The server could not be reached; try again shortly.");
    }
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<DeskConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return Ok(DeskConfig::from_file(path)?);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("agentdesk").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".agentdesk").join("config.toml")),
        Some(PathBuf::from("agentdesk.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return Ok(DeskConfig::from_file(path)?);
        }
    }

    debug!("No configuration file found, using defaults");
    Ok(DeskConfig::default())
}

/// Default configuration file path
fn config_path() -> DeskResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|dir| dir.join("agentdesk").join("config.toml"))
        .ok_or_else(|| config_error!("Could not determine a configuration directory", "cli"))
}

fn default_credentials_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("agentdesk"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("credentials.json")
}

/// Everything one command needs, wired to a single transport and store
struct Desk {
    clients: ApiClients,
    store: Arc<SessionStore>,
    navigator: Navigator,
    actions: AuthActions,
    credentials_path: PathBuf,
}

impl Desk {
    fn open(config: &DeskConfig) -> anyhow::Result<Self> {
        let clients = ApiClients::from_settings(&config.api)?;

        let credentials_path = config
            .session
            .credentials_path
            .clone()
            .unwrap_or_else(default_credentials_path);
        let restored = clients.credentials.load(&credentials_path)?;
        debug!(restored, "Loaded transport credentials");

        let record_path = config
            .session
            .record_path
            .clone()
            .unwrap_or_else(FileSessionRecord::default_path);
        let store = Arc::new(SessionStore::new(Arc::new(FileSessionRecord::new(
            record_path,
        ))));
        store.hydrate();

        let reconciler = Arc::new(
            SessionReconciler::new(Arc::clone(&store), clients.session.clone())
                .with_policy(config.session.policy),
        );
        let navigator = Navigator::new(reconciler);
        let actions = AuthActions::new(clients.session.clone(), Arc::clone(&store))
            .with_credentials(clients.credentials.clone());

        Ok(Self {
            clients,
            store,
            navigator,
            actions,
            credentials_path,
        })
    }

    /// Navigate to the view for `route`; fail unless it renders
    async fn enter(&self, route: Route) -> anyhow::Result<()> {
        match self.navigator.navigate(&route.path()).await {
            GuardDecision::Render(_) => Ok(()),
            GuardDecision::Redirect(Route::Login) => {
                bail!("Not logged in. Run `agentdesk login` first.")
            }
            GuardDecision::Redirect(other) => bail!("{} redirects to {}", route, other),
            GuardDecision::NotFound => bail!("No such view: {}", route),
        }
    }

    fn save_credentials(&self) {
        if let Err(e) = self.clients.credentials.save(&self.credentials_path) {
            warn!("Failed to save credentials: {}", e);
        }
    }
}

/// Turn an auth failure into the message a form would show
fn auth_failure(error: ClientError, fallback: &str) -> anyhow::Error {
    match &error {
        ClientError::InvalidForm(fields) => {
            for (field, message) in fields.iter() {
                eprintln!("  {}: {}", field, message);
            }
            anyhow!("Please fix the fields above")
        }
        ClientError::Core(_) => anyhow!(error.user_message(fallback)),
    }
}

async fn handle_login(desk: &Desk, email: String, password: String) -> anyhow::Result<()> {
    log_operation_start!("login");
    desk.enter(Route::Login).await?;

    let next = desk
        .actions
        .login(&LoginForm::new(email, password))
        .await
        .map_err(|e| {
            log_operation_error!("login", &e);
            auth_failure(e, "Login failed")
        })?;
    desk.enter(next).await?;

    let session = desk.store.get();
    let name = session.identity().map(|i| i.display_name()).unwrap_or_default();
    println!("✅ Logged in as {}", name);
    log_operation_success!("login");
    Ok(())
}

async fn handle_register(
    desk: &Desk,
    name: String,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    log_operation_start!("register");
    desk.enter(Route::Register).await?;

    if let Some(hint) = agentdesk_client::password_strength_hint(&password) {
        eprintln!("{}", hint);
    }

    let next = desk
        .actions
        .register(&RegisterForm::new(name, email, password))
        .await
        .map_err(|e| {
            log_operation_error!("register", &e);
            auth_failure(e, "Register failed")
        })?;
    desk.enter(next).await?;

    println!("✅ Account created");
    log_operation_success!("register");
    Ok(())
}

async fn handle_logout(desk: &Desk) -> anyhow::Result<()> {
    let next = desk.actions.logout().await;
    debug!(next = %next, "Logged out");
    println!("👋 Logged out");
    Ok(())
}

async fn handle_whoami(desk: &Desk, json: bool) -> anyhow::Result<()> {
    if desk.enter(Route::Projects).await.is_err() {
        println!("Not logged in");
        return Ok(());
    }

    let session = desk.store.get();
    let identity = session
        .identity()
        .ok_or_else(|| anyhow!("Session resolved without an identity"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(identity)?);
    } else {
        println!("{} ({})", identity.display_name(), identity.id);
    }
    Ok(())
}

async fn handle_open(desk: &Desk, path: &str) -> anyhow::Result<()> {
    match desk.navigator.open(path).await {
        GuardDecision::Render(route) => println!("Render {}", route),
        GuardDecision::Redirect(route) => println!("Redirect {}", route),
        GuardDecision::NotFound => println!("Not found: {}", path),
    }
    Ok(())
}

async fn handle_projects(desk: &Desk, action: ProjectCommands) -> anyhow::Result<()> {
    desk.enter(Route::Projects).await?;
    let workspace = &desk.clients.workspace;

    match action {
        ProjectCommands::List => {
            let projects = workspace.list_projects().await?;
            if projects.is_empty() {
                println!("No projects yet. Create one with `agentdesk projects create`.");
            }
            for project in projects {
                println!("{}  {}  {}", project.id, project.name, project.description);
            }
        }
        ProjectCommands::Create { name, description } => {
            let request = ProjectForm::new(name, description)
                .to_request()
                .map_err(|fields| anyhow!(fields.to_string()))?;
            let project = workspace.create_project(&request).await?;
            println!("✅ Created project {} ({})", project.name, project.id);
        }
    }
    Ok(())
}

async fn handle_agents(desk: &Desk, action: AgentCommands) -> anyhow::Result<()> {
    let workspace = &desk.clients.workspace;

    match action {
        AgentCommands::List { project_id } => {
            desk.enter(Route::Project(project_id.clone())).await?;
            let project = workspace.find_project(&project_id).await?;
            println!("{}", project.name);

            for agent in workspace.list_agents(&project.id).await? {
                println!("  {}  {}  [{}]", agent.id, agent.name, agent.model);
            }
        }
        AgentCommands::Create {
            project_id,
            name,
            model,
            prompt,
        } => {
            desk.enter(Route::Project(project_id.clone())).await?;
            let request = AgentForm::new(name, prompt)
                .with_model(model)
                .to_request(&project_id)
                .map_err(|fields| anyhow!(fields.to_string()))?;
            let agent = workspace.create_agent(&request).await?;
            println!("✅ Created agent {} ({})", agent.name, agent.id);
        }
    }
    Ok(())
}

async fn handle_chat(
    desk: &Desk,
    agent_id: String,
    message: Option<String>,
    html: bool,
) -> anyhow::Result<()> {
    desk.enter(Route::Chat(agent_id.clone())).await?;

    let mut transcript = ChatTranscript::load(desk.clients.workspace.clone(), agent_id).await;
    let already_shown = if message.is_some() {
        transcript.messages().len()
    } else {
        0
    };

    if let Some(message) = message {
        if !transcript.send(&message).await {
            bail!("Message is empty");
        }
    }

    if transcript.is_empty() {
        println!("No messages yet.");
        return Ok(());
    }

    let rendered = transcript.render();
    for (message, html_text) in transcript.messages().iter().zip(rendered).skip(already_shown) {
        let who = match message.role {
            agentdesk_api::ChatRole::User => "you",
            _ => "agent",
        };
        if html {
            println!("{}: {}", who, html_text);
        } else {
            println!("{}: {}", who, message.content);
        }
    }
    Ok(())
}

fn handle_config(config: &DeskConfig, show: bool, init: bool, validate: bool) -> anyhow::Result<()> {
    if init {
        let path = config_path()?;
        DeskConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("✅ Configuration initialized at: {:?}", path);
    }

    if show {
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }
        }
    }

    Ok(())
}
