use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::core::downloader::{DownloadStatus, FileStatus};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::{RuntimeProgress, RuntimeStatus};
use crate::core::launch::LaunchOptions;
use crate::core::state::{AppContext, ReleaseChannel};

/// Print the authorization URL and finish sign-in with the redirect the
/// browser lands on (`selene://auth?code=..&state=..`), pasted on stdin.
pub async fn login(ctx: &mut AppContext) -> LauncherResult<()> {
    let url = ctx.session.create_authorization_url()?;
    println!("Open this URL in your browser to sign in:\n\n  {url}\n");
    println!("Then paste the selene://auth redirect here:");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let redirect = lines
        .next_line()
        .await?
        .ok_or_else(|| LauncherError::Other("No redirect received".into()))?;

    ctx.session.handle_redirect(&redirect).await?;
    println!("Signed in.");
    Ok(())
}

pub async fn logout(ctx: &mut AppContext) -> LauncherResult<()> {
    ctx.session
        .sign_out()
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?;
    println!("Signed out.");
    Ok(())
}

pub async fn status(ctx: &mut AppContext) -> LauncherResult<()> {
    let settings = ctx.settings.settings().clone();
    println!(
        "Signed in:        {}",
        if ctx.session.is_signed_in() { "yes" } else { "no" }
    );
    println!("Release channel:  {}", settings.release_channel);
    println!(
        "Runtime path:     {}",
        if settings.runtime_path.is_empty() {
            "(java on PATH)"
        } else {
            settings.runtime_path.as_str()
        }
    );
    println!(
        "Managed runtime:  {}",
        if ctx.runtime.is_local_runtime_present().await {
            "installed"
        } else {
            "not installed"
        }
    );
    if let Some(server) = &settings.last_joined_server {
        println!("Last server:      {server}");
    }
    println!("Data directory:   {}", ctx.paths.app_data_dir().display());
    Ok(())
}

pub async fn update(ctx: &mut AppContext, channel: Option<ReleaseChannel>) -> LauncherResult<String> {
    if let Some(channel) = channel {
        ctx.settings.set_release_channel(channel);
        ctx.settings.save().await?;
    }
    let meta = ctx.check_for_update().await?;
    let downloaded = ctx.downloader.is_downloaded(&meta).await;
    println!(
        "Latest version: {} ({})",
        meta.version,
        if downloaded { "downloaded" } else { "not downloaded" }
    );
    Ok(meta.version)
}

pub async fn download(ctx: &mut AppContext, version: Option<String>) -> LauncherResult<String> {
    let version = match version {
        Some(version) => version,
        None => update(ctx, None).await?,
    };
    ctx.download_game(&version, &print_download_status).await?;
    println!("Version {version} is ready.");
    Ok(version)
}

pub async fn runtime(ctx: &mut AppContext) -> LauncherResult<()> {
    let path = ctx.provision_runtime(&print_runtime_progress).await?;
    println!("Java runtime installed at {}", path.display());
    Ok(())
}

pub async fn sync_bundles(
    ctx: &mut AppContext,
    server: &str,
    join_token: Option<String>,
) -> LauncherResult<()> {
    if let Some(token) = join_token {
        ctx.session.update_join_token(token);
    }
    let report = ctx
        .sync_bundles(server, &|message| {
            if let Some(message) = message {
                println!("{message}");
            }
        })
        .await?;

    println!(
        "{} bundles downloaded, {} failed",
        report.downloaded.len(),
        report.failed.len()
    );
    for id in &report.failed {
        warn!("Bundle {} could not be downloaded", id);
    }
    Ok(())
}

pub async fn servers(ctx: &mut AppContext) -> LauncherResult<()> {
    if let Some(featured) = ctx.servers.fetch_featured().await? {
        println!("Featured: {} ({})", featured.name, featured.address);
        if !featured.description.is_empty() {
            println!("  {}", featured.description);
        }
        println!();
    }

    let servers = ctx.servers.fetch_servers().await?;
    if servers.is_empty() {
        println!("No public servers listed.");
    }
    for server in servers {
        println!("{:<24} {}", server.name, server.address);
    }
    Ok(())
}

pub async fn launch(
    ctx: &mut AppContext,
    version: Option<String>,
    options: LaunchOptions,
) -> LauncherResult<()> {
    let version = match version.or_else(|| ctx.versions.latest_version().map(str::to_string)) {
        Some(version) => version,
        None => ctx.check_for_update().await?.version,
    };
    ctx.launch_game(&version, &options).await?;
    println!("Selene {version} started.");
    Ok(())
}

/// Update, download, make sure a runtime exists, sync the server's bundles
/// and start the game.
pub async fn play(
    ctx: &mut AppContext,
    server: Option<String>,
    join_token: Option<String>,
    options: LaunchOptions,
) -> LauncherResult<()> {
    let version = download(ctx, None).await?;

    if ctx.settings.settings().runtime_path.is_empty() {
        info!("No Java runtime configured, provisioning one");
        runtime(ctx).await?;
    }

    if let Some(server) = server {
        sync_bundles(ctx, &server, join_token).await?;
    }

    launch(ctx, Some(version), options).await
}

fn print_download_status(status: &DownloadStatus) {
    match status.status {
        FileStatus::Downloading if status.progress == 0 => {
            println!("[{}/{}] {}", status.index, status.total, status.file)
        }
        FileStatus::Downloading => {}
        FileStatus::Done => println!(
            "[{}/{}] {} done ({}%)",
            status.index, status.total, status.file, status.overall
        ),
        FileStatus::Error => println!(
            "[{}/{}] {} failed: {}",
            status.index,
            status.total,
            status.file,
            status.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn print_runtime_progress(progress: &RuntimeProgress) {
    match progress.status {
        RuntimeStatus::Downloading if progress.downloaded == 0 && progress.total > 0 => {
            println!("Downloading runtime ({} MB)...", progress.total / 1_048_576)
        }
        RuntimeStatus::Extracting => println!("Extracting runtime..."),
        RuntimeStatus::Error => println!(
            "Runtime setup failed: {}",
            progress.error.as_deref().unwrap_or("unknown error")
        ),
        _ => {}
    }
}
