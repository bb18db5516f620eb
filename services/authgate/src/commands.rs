//! Command-line parsing and execution

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use navigation::Navigator;
use serde_json::Value;
use session_auth::CredentialKey;
use transport::{Part, RequestDescriptor, Response};

use crate::app::App;
use crate::error::Error;

#[derive(Debug, Parser)]
#[command(
    name = "authgate",
    version,
    about = "Authenticated requests against a token-protected API",
    long_about = None
)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true, value_name = "PATH", env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Log in; the password is read from AUTHGATE_PASSWORD or stdin.
    Login { username: String },
    /// Clear the stored session.
    Logout,
    /// Show whether a session is stored.
    Status,
    /// Send a GET request.
    Get { path: String },
    /// Send a DELETE request.
    Delete { path: String },
    /// Send a POST request with a JSON body.
    Post {
        path: String,
        #[arg(value_parser = parse_json)]
        body: Value,
    },
    /// Upload a file as multipart form data.
    Upload {
        path: String,
        field: String,
        file: PathBuf,
    },
    /// Navigate to a route through the route guard.
    Navigate { path: String },
}

fn parse_json(raw: &str) -> crate::error::Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::InvalidJson(e.to_string()))
}

/// Execute `command`, writing human-readable output to `out`.
///
/// `input` supplies the password for `login` when `AUTHGATE_PASSWORD` is
/// unset.
pub async fn run(
    app: &App,
    command: Command,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<()> {
    match command {
        Command::Login { username } => {
            let password = read_password(input)?;
            app.gateway
                .login(&username, &password)
                .await
                .context("login failed")?;
            writeln!(out, "logged in as {username}")?;
            let landed = app.router.push(app.router.guard().landing_path())?;
            writeln!(out, "at {}", landed.path)?;
        }
        Command::Logout => {
            app.gateway.logout().context("logout failed")?;
            writeln!(out, "logged out")?;
        }
        Command::Status => match app.store.get(CredentialKey::AccessToken) {
            Some(_) => {
                let username = app
                    .store
                    .get(CredentialKey::Username)
                    .unwrap_or_else(|| "<unknown>".to_string());
                writeln!(out, "logged in as {username}")?;
            }
            None => writeln!(out, "logged out")?,
        },
        Command::Get { path } => send(app, RequestDescriptor::get(path), out).await?,
        Command::Delete { path } => send(app, RequestDescriptor::delete(path), out).await?,
        Command::Post { path, body } => {
            send(app, RequestDescriptor::post(path).json(body), out).await?
        }
        Command::Upload { path, field, file } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let part = Part::file(field, file_name(&file), data);
            send(app, RequestDescriptor::post(path).multipart(vec![part]), out).await?
        }
        Command::Navigate { path } => {
            let route = app.router.push(&path)?;
            writeln!(out, "{} ({}: {})", route.path, route.name, route.view)?;
            for (name, value) in &route.params {
                writeln!(out, "  {name} = {value}")?;
            }
        }
    }
    Ok(())
}

async fn send(app: &App, request: RequestDescriptor, out: &mut dyn Write) -> Result<()> {
    match app.gateway.execute(&request).await {
        Ok(response) => print_response(&response, out),
        Err(e) if e.is_unauthenticated() => {
            let location = app
                .router
                .current_path()
                .unwrap_or_else(|| app.router.guard().login_path().to_string());
            writeln!(out, "session ended, now at {location}")?;
            Err(e).context("authentication required")
        }
        Err(e) => Err(e).with_context(|| format!("{} {} failed", request.method, request.url)),
    }
}

fn print_response(response: &Response, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", response.status)?;
    if response.body.is_empty() {
        return Ok(());
    }
    match response.json::<Value>() {
        Ok(json) => writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?,
        Err(_) => writeln!(out, "{}", response.text())?,
    }
    Ok(())
}

fn read_password(input: &mut dyn BufRead) -> Result<String> {
    if let Ok(password) = std::env::var("AUTHGATE_PASSWORD") {
        return Ok(password);
    }
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("empty password: set AUTHGATE_PASSWORD or pipe it on stdin");
    }
    Ok(password)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}
