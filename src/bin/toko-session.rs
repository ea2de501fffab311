use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use http::Method;
use toko_session::{
    routes, ApiRequest, AuthApi, AuthError, ClientError, Config, ConfigError, FileStore,
    LoginArea, RegistrationForm, Rendered, RouteGuard, Session, SessionClient, SessionHandle,
    StoreError, TracingNavigator,
};
use tracing::error;

/// Drive the Toko Ilham session flows against a running backend.
#[derive(Debug, Parser)]
#[command(name = "toko-session", version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "TOKO_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in to the storefront
    Login {
        username: String,
        #[arg(long, env = "TOKO_PASSWORD")]
        password: String,
    },
    /// Log in to the admin console
    LoginAdmin {
        username: String,
        #[arg(long, env = "TOKO_PASSWORD")]
        password: String,
    },
    /// Create a customer account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        phone: String,
        #[arg(long, env = "TOKO_PASSWORD")]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Forget the stored session
    Logout {
        #[arg(long, value_enum, default_value_t = Area::Customer)]
        area: Area,
    },
    /// Show the stored session
    Status,
    /// Open an application path the way the route guard would
    Visit { path: String },
    /// Send a request to the backend through the session client
    Request {
        #[arg(value_parser = parse_method)]
        method: Method,
        path: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Area {
    Customer,
    Admin,
}

impl From<Area> for LoginArea {
    fn from(area: Area) -> Self {
        match area {
            Area::Customer => LoginArea::Customer,
            Area::Admin => LoginArea::Admin,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),
    #[error("--data is not valid JSON: {0}")]
    Body(#[from] serde_json::Error),
}

fn parse_method(value: &str) -> Result<Method, http::method::InvalidMethod> {
    Method::from_bytes(value.to_ascii_uppercase().as_bytes())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    toko_session::init_tracing(cli.json_logs);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), CliError> {
    let config = Config::from_env()?;
    let session = SessionHandle::new(FileStore::open(config.session_file())?);
    let client = SessionClient::builder(config, session.clone(), TracingNavigator).build()?;
    let auth = AuthApi::new(client.clone());

    match command {
        Command::Login { username, password } => {
            let session = auth.login(&username, &password).await?;
            println!("logged in as {} ({})", username, role_label(&session));
        }
        Command::LoginAdmin { username, password } => {
            auth.login_admin(&username, &password).await?;
            println!("logged in to the admin console as {username}");
        }
        Command::Register {
            email,
            username,
            phone,
            password,
            confirm_password,
        } => {
            let form = RegistrationForm {
                email,
                username,
                phone,
                password,
                confirm_password,
            };
            auth.register(&form).await?;
            println!("Account successfully registered!");
        }
        Command::Logout { area } => {
            auth.logout(area.into())?;
            println!("logged out");
        }
        Command::Status => {
            let current = session.current();
            match &current.token {
                None => println!("not logged in"),
                Some(_) => println!(
                    "logged in: user {} ({})",
                    current
                        .user_id
                        .as_ref()
                        .map(|id| id.as_str())
                        .unwrap_or("?"),
                    role_label(&current)
                ),
            }
        }
        Command::Visit { path } => match routes::requirement_for(&path) {
            None => println!("{path}: public"),
            Some(requirement) => {
                let mounted = RouteGuard::new(client).mount(requirement, path.as_str());
                mounted.verify().await;
                match mounted.render(|| ()) {
                    Rendered::Loading => println!("{path}: still verifying"),
                    Rendered::Content(()) => println!("{path}: granted"),
                    Rendered::Redirect(navigation) => {
                        println!("{path}: denied, redirected to {}", navigation.path())
                    }
                }
            }
        },
        Command::Request { method, path, data } => {
            let mut request = ApiRequest::new(method, path);
            if let Some(data) = data {
                request = request.json_value(serde_json::from_str(&data)?);
            }
            let response = client.send(request).await?;
            println!("{}", response.text());
        }
    }

    Ok(())
}

fn role_label(session: &Session) -> &'static str {
    session.role.map(|role| role.as_str()).unwrap_or("unknown role")
}
