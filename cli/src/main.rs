use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use arogya_cli::config::{Cli, Command, CredentialArgs};
use arogya_cli::present::{alert_line, status_line, Transcript};
use arogya_cli::{FileKvStore, PathPicker, ReqwestExecutor, Shell};
use clap::Parser;
use shared::model::{AlertKind, Screen, ServerStatus};
use shared::{Event, ScreenView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli
        .settings
        .to_config()
        .context("invalid configuration")?;
    tracing::info!(base_url = %config.api_base_url, "starting");

    let store = FileKvStore::open(&cli.settings.data_dir)
        .await
        .with_context(|| format!("cannot open data dir {}", cli.settings.data_dir.display()))?;
    let picker = Arc::new(PathPicker::new());
    let http = ReqwestExecutor::new(Duration::from_millis(config.request_timeout_ms))
        .context("cannot build HTTP client")?;
    let mut shell = Shell::new(config, Arc::new(http), Arc::new(store), picker.clone());

    let result = match cli.command {
        Command::Signup(credentials) => signup(&mut shell, &credentials).await,
        Command::Login(credentials) => login(&mut shell, &credentials).await,
        Command::Health => health(&mut shell).await,
        Command::Ask {
            credentials,
            message,
            image,
        } => ask(&mut shell, &picker, &credentials, message, image).await,
        Command::Session(credentials) => session(&mut shell, &picker, &credentials).await,
    };

    shell.shutdown().await;
    result
}

fn enter_credentials(shell: &mut Shell, credentials: &CredentialArgs) {
    shell.dispatch(Event::EmailChanged(credentials.email.clone()));
    shell.dispatch(Event::PasswordChanged(credentials.password.clone()));
}

/// Prints the current alert, if any, and dismisses it. Returns the error
/// message when the alert was an error.
fn take_alert(shell: &mut Shell) -> Option<String> {
    let alert = shell.view().alert?;
    println!("{}", alert_line(&alert));
    shell.dispatch(Event::DismissAlert);
    (alert.kind == AlertKind::Error).then_some(alert.message)
}

async fn signup(shell: &mut Shell, credentials: &CredentialArgs) -> Result<()> {
    enter_credentials(shell, credentials);
    shell.dispatch(Event::SignupRequested);
    shell.settle().await?;
    if let Some(error) = take_alert(shell) {
        bail!(error);
    }
    Ok(())
}

async fn login(shell: &mut Shell, credentials: &CredentialArgs) -> Result<()> {
    enter_credentials(shell, credentials);
    shell.dispatch(Event::LoginRequested);
    shell.settle().await?;
    if let Some(error) = take_alert(shell) {
        bail!(error);
    }
    if shell.screen() != Screen::Home {
        bail!("login did not complete");
    }
    println!("logged in as {}", credentials.email);
    Ok(())
}

async fn health(shell: &mut Shell) -> Result<()> {
    shell.dispatch(Event::HealthCheckRequested);
    shell.settle().await?;
    let status = shell.view().server_status;
    println!("{}", status_line(status));
    if status != ServerStatus::Reachable {
        bail!("health check failed");
    }
    Ok(())
}

async fn pick(shell: &mut Shell, picker: &PathPicker, path: PathBuf) -> Result<()> {
    picker.set_next(path).await;
    shell.dispatch(Event::PickImageRequested);
    shell.settle().await?;
    let attached = matches!(
        shell.view().screen,
        ScreenView::Chat {
            pending_image: Some(_),
            ..
        }
    );
    if !attached {
        bail!("image could not be attached (see log)");
    }
    Ok(())
}

/// Sends the composition and prints whatever the conversation gained.
async fn send(shell: &mut Shell, transcript: &mut Transcript) -> Result<()> {
    shell.dispatch(Event::SendRequested);
    shell.settle().await?;
    for line in transcript.new_lines(&shell.view()) {
        println!("{line}");
    }
    if let Some(error) = take_alert(shell) {
        bail!(error);
    }
    Ok(())
}

async fn ask(
    shell: &mut Shell,
    picker: &PathPicker,
    credentials: &CredentialArgs,
    message: Option<String>,
    image: Option<PathBuf>,
) -> Result<()> {
    if message.is_none() && image.is_none() {
        bail!("nothing to send: pass --message, --image or both");
    }

    login(shell, credentials).await?;
    shell.dispatch(Event::Navigate(Screen::Chat));

    if let Some(path) = image {
        pick(shell, picker, path).await?;
    }
    if let Some(message) = message {
        shell.dispatch(Event::MessageChanged(message));
    }

    send(shell, &mut Transcript::default()).await
}

const SESSION_HELP: &str = "\
commands:
  :home | :chat | :emergency   switch screen
  :image <path>                attach an image to the next message
  :send                        send the attached image without text
  :health                      check the backend
  :quit                        leave
anything else is sent as a chat message";

async fn session(shell: &mut Shell, picker: &PathPicker, credentials: &CredentialArgs) -> Result<()> {
    login(shell, credentials).await?;
    shell.dispatch(Event::Navigate(Screen::Chat));
    println!("{SESSION_HELP}");

    let mut transcript = Transcript::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handle_line(shell, picker, &mut transcript, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
    Ok(())
}

/// Runs one REPL line. Returns `false` when the user asked to leave.
async fn handle_line(
    shell: &mut Shell,
    picker: &PathPicker,
    transcript: &mut Transcript,
    line: &str,
) -> Result<bool> {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "" => {}
        ":quit" | ":q" => return Ok(false),
        ":home" => navigate(shell, Screen::Home)?,
        ":chat" => navigate(shell, Screen::Chat)?,
        ":emergency" => {
            navigate(shell, Screen::Emergency)?;
            if let ScreenView::Emergency { title, message } = shell.view().screen {
                println!("{title}: {message}");
            }
        }
        ":image" if !arg.trim().is_empty() => {
            navigate(shell, Screen::Chat)?;
            pick(shell, picker, PathBuf::from(arg.trim())).await?;
            for line in transcript.new_lines(&shell.view()) {
                println!("{line}");
            }
        }
        ":send" => send(shell, transcript).await?,
        ":health" => {
            shell.dispatch(Event::HealthCheckRequested);
            shell.settle().await?;
            println!("{}", status_line(shell.view().server_status));
        }
        c if c.starts_with(':') => println!("{SESSION_HELP}"),
        _ => {
            navigate(shell, Screen::Chat)?;
            shell.dispatch(Event::MessageChanged(line.to_string()));
            send(shell, transcript).await?;
        }
    }
    Ok(true)
}

fn navigate(shell: &mut Shell, screen: Screen) -> Result<()> {
    shell.dispatch(Event::Navigate(screen));
    if shell.screen() != screen {
        bail!("cannot open {screen} from here");
    }
    Ok(())
}
