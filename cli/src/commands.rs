use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use taskhub_core::{
    ApiClient, ApiError, AuthService, ClientConfig, FileTokenStorage, NewTask, NewUser,
    ReqwestTransport, SessionStore, Task, TaskPatch, TaskService, TaskStatus, Transport, User,
    UserPatch, UserService,
};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the session token
    Logout,
    /// Show whether a session token is stored
    Status,
    /// Create an account (no login needed)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    List,
    Get { id: i64 },
    Create(NewTaskArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: TaskPatchArgs,
    },
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct NewTaskArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    description: String,
    /// pending, in-progress, completed, or the numeric code
    #[arg(long, default_value = "pending")]
    status: TaskStatus,
    #[arg(long)]
    user_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct TaskPatchArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    status: Option<TaskStatus>,
    #[arg(long)]
    user_id: Option<i64>,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    List,
    Get { id: i64 },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete { id: i64 },
}

impl From<NewTaskArgs> for NewTask {
    fn from(args: NewTaskArgs) -> Self {
        NewTask {
            name: args.name,
            description: args.description,
            status: args.status,
            email: args.email,
            user_id: args.user_id,
        }
    }
}

impl From<TaskPatchArgs> for TaskPatch {
    fn from(args: TaskPatchArgs) -> Self {
        TaskPatch {
            name: args.name,
            description: args.description,
            status: args.status,
            email: args.email,
            user_id: args.user_id,
        }
    }
}

/// Everything a command needs: the session and one façade per resource.
pub struct App {
    session: Arc<SessionStore>,
    auth: AuthService,
    tasks: TaskService,
    users: UserService,
}

impl App {
    pub fn new(base_url: &str, session: Arc<SessionStore>, transport: Arc<dyn Transport>) -> Self {
        let client = ApiClient::new(base_url, session.clone(), transport);
        Self {
            session,
            auth: AuthService::new(client.clone()),
            tasks: TaskService::new(client.clone()),
            users: UserService::new(client),
        }
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let storage = FileTokenStorage::new(&config.session.dir);
        let session = SessionStore::open(storage).context("cannot read stored session")?;
        let transport = ReqwestTransport::with_timeout(config.api.timeout())
            .context("cannot initialise HTTP client")?;
        Ok(Self::new(
            &config.api.base_url,
            Arc::new(session),
            Arc::new(transport),
        ))
    }
}

pub async fn run<W: Write>(command: Command, config: &ClientConfig, out: &mut W) -> anyhow::Result<()> {
    let app = App::from_config(config)?;
    execute(&app, command, out).await
}

pub async fn execute<W: Write>(app: &App, command: Command, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let token = app.auth.login(&email, &password).await?;
            app.session.set_token(token).context("cannot store session token")?;
            writeln!(out, "logged in as {}", email.trim())?;
        }
        Command::Logout => {
            app.session.clear_token().context("cannot remove session token")?;
            writeln!(out, "logged out")?;
        }
        Command::Status => {
            writeln!(out, "{}", app.session.state())?;
        }
        Command::Register { name, email } => {
            let user = app.users.create(&NewUser { name, email }).await?;
            writeln!(out, "registered user #{}; log in to continue", user.id)?;
        }
        Command::Task(command) => task(app, command, out).await?,
        Command::User(command) => user(app, command, out).await?,
    }
    Ok(())
}

async fn task<W: Write>(app: &App, command: TaskCommand, out: &mut W) -> anyhow::Result<()> {
    match command {
        TaskCommand::List => {
            let tasks = app.tasks.list_all().await?;
            if tasks.is_empty() {
                writeln!(out, "no tasks")?;
            }
            for task in &tasks {
                writeln!(out, "{}", task_line(task))?;
            }
        }
        TaskCommand::Get { id } => print_json(out, &app.tasks.get_by_id(id).await?)?,
        TaskCommand::Create(args) => print_json(out, &app.tasks.create(&args.into()).await?)?,
        TaskCommand::Update { id, fields } => {
            let patch: TaskPatch = fields.into();
            if patch.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            print_json(out, &app.tasks.update(id, &patch).await?)?;
        }
        TaskCommand::Delete { id } => {
            app.tasks.remove(id).await?;
            writeln!(out, "deleted task #{id}")?;
        }
    }
    Ok(())
}

async fn user<W: Write>(app: &App, command: UserCommand, out: &mut W) -> anyhow::Result<()> {
    match command {
        UserCommand::List => {
            let users = app.users.list_all().await?;
            if users.is_empty() {
                writeln!(out, "no users")?;
            }
            for user in &users {
                writeln!(out, "{}", user_line(user))?;
            }
        }
        UserCommand::Get { id } => print_json(out, &app.users.get_by_id(id).await?)?,
        UserCommand::Create { name, email } => {
            print_json(out, &app.users.create(&NewUser { name, email }).await?)?
        }
        UserCommand::Update { id, name, email } => {
            let patch = UserPatch { name, email };
            if patch.is_empty() {
                anyhow::bail!("nothing to update; pass --name or --email");
            }
            print_json(out, &app.users.update(id, &patch).await?)?;
        }
        UserCommand::Delete { id } => {
            app.users.remove(id).await?;
            writeln!(out, "deleted user #{id}")?;
        }
    }
    Ok(())
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn task_line(task: &Task) -> String {
    let owner = task
        .user
        .as_ref()
        .map(|u| format!(" @{}", u.name))
        .unwrap_or_default();
    format!("#{} [{}] {} <{}>{}", task.id, task.status, task.name, task.email, owner)
}

fn user_line(user: &User) -> String {
    format!(
        "#{} {} <{}> tasks: {}",
        user.id,
        user.name,
        user.email,
        user.task_count()
    )
}

/// One-line failure message with a hint matching the failure kind.
pub fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => format!("{api} ({})", advice(api)),
        None => format!("{err:#}"),
    }
}

fn advice(err: &ApiError) -> &'static str {
    match err {
        ApiError::Validation(_) => "fix the input and try again",
        ApiError::Transport(_) => "check the server address and your connection, then retry",
        e if e.is_unauthorized() => "run `taskhub login` first",
        e if e.is_not_found() => "check the id",
        ApiError::Request { .. } => "the server rejected the request",
        ApiError::InvalidPath(_) | ApiError::Serialization(_) | ApiError::Deserialization(_) => {
            "the client and server disagree on the API; check the base URL"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_core::{FakeTransport, MemoryTokenStorage, TaskStatus, TokenStorage, TransportError};

    fn app_with(slot: MemoryTokenStorage) -> (App, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        let session = Arc::new(SessionStore::open(slot).unwrap());
        (App::new("http://api.test", session, transport.clone()), transport)
    }

    async fn output(app: &App, command: Command) -> anyhow::Result<String> {
        let mut out = Vec::new();
        execute(app, command, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn login_stores_token_used_by_next_request() {
        let slot = MemoryTokenStorage::new();
        let (app, transport) = app_with(slot.clone());
        transport.respond(200, r#"{"token":"xyz"}"#);
        transport.respond(200, "[]");

        let text = output(
            &app,
            Command::Login {
                email: "a@b.com".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(text, "logged in as a@b.com\n");
        assert_eq!(slot.load().unwrap().as_deref(), Some("xyz"));

        let text = output(&app, Command::Task(TaskCommand::List)).await.unwrap();
        assert_eq!(text, "no tasks\n");
        let requests = transport.requests();
        assert_eq!(requests[0].header("authorization"), None);
        assert_eq!(requests[1].header("authorization"), Some("Bearer xyz"));
    }

    #[tokio::test]
    async fn login_persists_for_the_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new());
        transport.respond(200, r#"{"token":"persisted"}"#);
        let session = Arc::new(SessionStore::open(FileTokenStorage::new(dir.path())).unwrap());
        let app = App::new("http://api.test", session, transport);
        output(
            &app,
            Command::Login {
                email: "a@b.com".to_string(),
                password: "pw".to_string(),
            },
        )
        .await
        .unwrap();
        drop(app);

        let mut config = ClientConfig::default();
        config.session.dir = dir.path().to_path_buf();
        let next_run = App::from_config(&config).unwrap();
        assert_eq!(next_run.session.get_token().as_deref(), Some("persisted"));
        assert_eq!(output(&next_run, Command::Status).await.unwrap(), "authenticated\n");

        output(&next_run, Command::Logout).await.unwrap();
        assert!(!FileTokenStorage::new(dir.path()).path().exists());
    }

    #[tokio::test]
    async fn failed_login_leaves_session_anonymous() {
        let slot = MemoryTokenStorage::new();
        let (app, transport) = app_with(slot.clone());
        transport.respond(401, "Invalid credentials");

        let err = output(
            &app,
            Command::Login {
                email: "a@b.com".to_string(),
                password: "bad".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(describe(&err).contains("Invalid credentials"));
        assert_eq!(slot.load().unwrap(), None);
        assert_eq!(output(&app, Command::Status).await.unwrap(), "anonymous\n");
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let slot = MemoryTokenStorage::with_token("t");
        let (app, _) = app_with(slot.clone());
        assert_eq!(output(&app, Command::Status).await.unwrap(), "authenticated\n");
        output(&app, Command::Logout).await.unwrap();
        output(&app, Command::Logout).await.unwrap();
        assert_eq!(slot.load().unwrap(), None);
        assert_eq!(output(&app, Command::Status).await.unwrap(), "anonymous\n");
    }

    #[tokio::test]
    async fn task_list_renders_lines() {
        let (app, transport) = app_with(MemoryTokenStorage::with_token("t"));
        transport.respond(
            200,
            r#"[{"id":1,"name":"Plan","description":"","status":1,"email":"a@b.com","userId":2,
                 "user":{"id":2,"name":"Ana","email":"ana@b.com"}}]"#,
        );
        let text = output(&app, Command::Task(TaskCommand::List)).await.unwrap();
        assert_eq!(text, "#1 [In Progress] Plan <a@b.com> @Ana\n");
    }

    #[tokio::test]
    async fn empty_update_is_refused_locally() {
        let (app, transport) = app_with(MemoryTokenStorage::with_token("t"));
        let command = Command::User(UserCommand::Update {
            id: 1,
            name: None,
            email: None,
        });
        assert!(output(&app, command).await.is_err());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn create_task_maps_arguments() {
        let (app, transport) = app_with(MemoryTokenStorage::with_token("t"));
        transport.respond(
            201,
            r#"{"id":9,"name":"Ship","description":"","status":2,"email":"a@b.com"}"#,
        );
        let command = Command::Task(TaskCommand::Create(NewTaskArgs {
            name: "Ship".to_string(),
            email: "a@b.com".to_string(),
            description: String::new(),
            status: TaskStatus::Completed,
            user_id: None,
        }));
        let text = output(&app, command).await.unwrap();
        assert!(text.contains("\"id\": 9"));
        let body: serde_json::Value =
            serde_json::from_str(transport.last_request().unwrap().body.as_deref().unwrap()).unwrap();
        assert_eq!(body["status"], 2);
    }

    #[test]
    fn advice_depends_on_failure_kind() {
        let transport = anyhow::Error::new(ApiError::from(TransportError::Timeout));
        assert!(describe(&transport).contains("retry"));

        let unauthorized = anyhow::Error::new(ApiError::Request {
            status: 401,
            message: "Unauthorized".to_string(),
        });
        assert!(describe(&unauthorized).contains("taskhub login"));

        let missing = anyhow::Error::new(ApiError::Request {
            status: 404,
            message: "Not found".to_string(),
        });
        assert!(describe(&missing).contains("check the id"));

        let other = anyhow::anyhow!("plain failure");
        assert_eq!(describe(&other), "plain failure");
    }
}
