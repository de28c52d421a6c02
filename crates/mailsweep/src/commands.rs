//! Command handlers.

use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};
use mailsweep_client::{ClientConfig, HttpTriageService, credentials};
use mailsweep_core::{
    AuthState, DateFilter, FetchOutcome, FetchRequest, Section, Session, TriageService,
};
use tracing::{debug, info, warn};

use crate::cli::{Command, SettingsAction};
use crate::render;
use crate::settings::Settings;

/// Options of the `triage` command.
struct TriageArgs {
    request: FetchRequest,
    delete_suggested: bool,
    bodies: bool,
}

/// Runs `command` against the service configured in `settings`.
pub async fn run(command: Command, settings: Settings, settings_path: &Path) -> Result<()> {
    match command {
        Command::Status => status(&settings).await,
        Command::Login { cookie, no_browser } => login(&settings, cookie, no_browser).await,
        Command::Logout => logout(&settings).await,
        Command::Triage {
            count,
            window,
            from,
            to,
            delete_suggested,
            bodies,
        } => {
            let mut request = FetchRequest::new(count.unwrap_or(settings.default_count));
            if let Some(window) = window {
                request = request.with_window(window);
            } else if let Some(filter) = DateFilter::from_bounds(from, to)? {
                request.date_filter = Some(filter);
            }
            let args = TriageArgs {
                request,
                delete_suggested,
                bodies,
            };
            triage(&settings, args).await
        }
        Command::Refresh {
            delete_suggested,
            bodies,
        } => refresh(&settings, delete_suggested, bodies).await,
        Command::Settings { action } => match action {
            SettingsAction::Init { force } => init_settings(settings_path, force).await,
            SettingsAction::Show => show_settings(&settings, settings_path),
        },
    }
}

/// Client configuration with the stored session cookie, if any.
fn client_config(settings: &Settings) -> Result<ClientConfig> {
    let config = settings.client_config(None)?;
    match credentials::get_session_cookie(config.host()) {
        Ok(Some(cookie)) => {
            debug!("Using stored session for {}", config.host());
            Ok(config.with_session_cookie(cookie))
        }
        Ok(None) => Ok(config),
        Err(e) => {
            warn!("Could not read the stored session: {e}");
            Ok(config)
        }
    }
}

fn open_session(settings: &Settings, config: ClientConfig) -> Result<Session<HttpTriageService>> {
    let service = HttpTriageService::new(config).context("Failed to create HTTP client")?;
    Ok(Session::new(service, settings.session_config()))
}

/// A session that passed the auth check.
async fn signed_in_session(settings: &Settings) -> Result<Session<HttpTriageService>> {
    let mut session = open_session(settings, client_config(settings)?)?;
    if session.start().await? != AuthState::SignedIn {
        bail!(
            "Not signed in. Sign in at {} and run `mailsweep login --cookie <value>`",
            session.login_url()
        );
    }
    Ok(session)
}

async fn status(settings: &Settings) -> Result<()> {
    let mut session = open_session(settings, client_config(settings)?)?;
    match session.start().await? {
        AuthState::SignedIn => println!("Signed in to {}", settings.server_url),
        _ => println!("Signed out. Sign in at {}", session.login_url()),
    }
    Ok(())
}

async fn login(settings: &Settings, cookie: Option<String>, no_browser: bool) -> Result<()> {
    let config = settings.client_config(None)?;

    let Some(cookie) = cookie else {
        let url = config.login_url();
        println!("Sign in at {url}");
        if !no_browser
            && let Err(e) = opener::open(url.as_str())
        {
            warn!("Could not open a browser: {e}");
        }
        println!(
            "Then copy the `session` cookie from your browser and run `mailsweep login --cookie <value>`"
        );
        return Ok(());
    };

    let host = config.host().to_string();
    let mut session = open_session(settings, config.with_session_cookie(cookie.clone()))?;
    if session.start().await? != AuthState::SignedIn {
        bail!("The service rejected that session cookie");
    }

    credentials::store_session_cookie(&host, &cookie)
        .context("Failed to store the session in the keyring")?;
    info!("Stored session for {host}");
    println!("Signed in to {}", settings.server_url);
    Ok(())
}

async fn logout(settings: &Settings) -> Result<()> {
    let config = client_config(settings)?;
    let host = config.host().to_string();
    let mut session = open_session(settings, config)?;

    let result = session.logout().await;
    credentials::delete_session_cookie(&host)
        .context("Failed to remove the stored session")?;
    result?;

    println!("Signed out");
    Ok(())
}

async fn triage(settings: &Settings, args: TriageArgs) -> Result<()> {
    let mut session = signed_in_session(settings).await?;

    println!("{}", render::fetch_criteria(&args.request));
    if session.fetch(args.request).await? == FetchOutcome::NoResults {
        println!("{}", mailsweep_core::NO_RESULTS_TEXT);
        return Ok(());
    }
    if let Some(batch) = session.view().batch() {
        print!("{}", render::batch(batch.messages(), args.bodies));
    }

    let mut progress = session.subscribe_progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let current = *progress.borrow_and_update();
            if current.total_batches > 0 {
                eprintln!("{}", render::progress(&current));
            }
        }
    });

    let summary = session
        .analyze_or_cancel(cancel_on(tokio::signal::ctrl_c()))
        .await;
    reporter.abort();

    let Some(summary) = summary? else {
        println!("Analysis cancelled");
        return Ok(());
    };
    debug!(
        "Analysis merged {} to delete, {} important over {} batches",
        summary.to_delete, summary.important, summary.batches_processed
    );

    finish(&mut session, args.delete_suggested, args.bodies).await
}

/// Resolves once `signal` fires. Never resolves if the signal handler
/// could not be installed.
async fn cancel_on(signal: impl Future<Output = io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!("Could not listen for Ctrl-C, analysis cannot be cancelled: {e}");
        std::future::pending::<()>().await;
    }
}

async fn refresh(settings: &Settings, delete_suggested: bool, bodies: bool) -> Result<()> {
    let mut session = signed_in_session(settings).await?;
    session.refresh().await?;
    finish(&mut session, delete_suggested, bodies).await
}

/// Prints the dashboard and optionally deletes the suggested messages.
async fn finish<S: TriageService>(
    session: &mut Session<S>,
    delete_suggested: bool,
    bodies: bool,
) -> Result<()> {
    print!("{}", render::dashboard(session.store(), bodies));

    if !delete_suggested {
        return Ok(());
    }
    if session.store().section(Section::ToDelete).next().is_none() {
        println!("\nNothing to delete");
        return Ok(());
    }

    session.clear_selection();
    session.toggle_section(Section::ToDelete)?;
    let report = session.delete_selected().await?;
    println!("\n{report}");
    for failure in &report.failed {
        println!("  {}: {}", failure.id, failure.reason);
    }
    print!("\n{}", render::stats(&session.stats()));
    Ok(())
}

async fn init_settings(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, use --force to overwrite it",
            path.display()
        );
    }
    Settings::default().save(path).await?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show_settings(settings: &Settings, path: &Path) -> Result<()> {
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_cancel_fires_with_signal() {
        let fired = tokio::time::timeout(Duration::from_secs(1), cancel_on(async { Ok(()) })).await;
        assert!(fired.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_never_fires_without_handler() {
        let signal = async { Err(io::Error::other("no signal handler")) };
        let fired = tokio::time::timeout(Duration::from_millis(50), cancel_on(signal)).await;
        assert!(fired.is_err());
    }
}
