use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use vitrine_iiif::find_auth_services;

use crate::auth::{
    AuthConfig, AuthNegotiator, AuthState, HttpMessageFrame, InfoFetcher, LoginOpener, LoginWindow,
};
use crate::terminal::cli::{DiscoverArgs, ViewArgs};
use crate::terminal::error::CliError;
use crate::ui::TerminalUi;
use crate::viewer::LogViewer;

/// Terminal stand-in for the browser login popup.
///
/// The login address is printed for the user to visit in a browser; the
/// window counts as closed once they press Enter here.
pub struct PromptLoginOpener;

struct PromptLoginWindow {
    closed: Arc<AtomicBool>,
}

impl LoginWindow for PromptLoginWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl LoginOpener for PromptLoginOpener {
    fn open(&self, login_uri: &str, window_name: &str) -> anyhow::Result<Arc<dyn LoginWindow>> {
        println!("🔐 Complete the login in your browser ({window_name}):");
        println!("   {login_uri}");
        println!("   Press Enter here once the login window has closed.");
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();
        thread::spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().read_line(&mut line);
            flag.store(true, Ordering::SeqCst);
        });
        Ok(Arc::new(PromptLoginWindow { closed }))
    }
}

pub async fn run_view(args: ViewArgs) -> Result<(), CliError> {
    let config = AuthConfig::from_env()?;
    let frame = Arc::new(HttpMessageFrame::new(config.http_timeout)?);
    let mut negotiator = AuthNegotiator::new(
        &config,
        Arc::new(PromptLoginOpener),
        frame,
        Arc::new(TerminalUi::new()),
        Arc::new(LogViewer),
    )?;

    negotiator.open_resource(&args.resource).await?;

    loop {
        if !negotiator.login_available() {
            break;
        }
        if !args.auto_login && !confirm("Log in now? [y/N] ").await? {
            break;
        }
        negotiator.begin_login().await?;

        if negotiator.state() == AuthState::Authorized {
            println!("✅ Authorized view open for {}", args.resource);
            if args.auto_login {
                break;
            }
            if negotiator.logout_available()
                && confirm("Log out and reopen the public view? [y/N] ").await?
            {
                negotiator.logout().await?;
                continue;
            }
            break;
        }
        if args.auto_login {
            // one attempt in non-interactive mode
            break;
        }
    }
    Ok(())
}

pub async fn run_discover(args: DiscoverArgs) -> Result<(), CliError> {
    let config = AuthConfig::from_env()?;
    let fetcher = InfoFetcher::new(config.http_timeout)?;
    let document = fetcher.fetch_info(&args.resource).await?;
    let services = find_auth_services(&document);

    println!("Auth services for {}", args.resource);
    match services.login.as_deref() {
        Some(login) => println!("  login:  {login} (label: {})", services.login_label),
        None => println!("  login:  none"),
    }
    match services.token.as_deref() {
        Some(token) => println!("  token:  {token}"),
        None => println!("  token:  none"),
    }
    match services.logout.as_deref() {
        Some(logout) => println!("  logout: {logout} (label: {})", services.logout_label),
        None => println!("  logout: none"),
    }
    Ok(())
}

async fn confirm(prompt: &str) -> Result<bool, CliError> {
    let prompt = prompt.to_string();
    let answer = tokio::task::spawn_blocking(move || -> Result<String, io::Error> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line)
    })
    .await
    .map_err(|err| CliError::Runtime(err.to_string()))??;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
