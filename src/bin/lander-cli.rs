use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "lander-cli")]
#[command(about = "Management CLI for caddy-lander", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "ADMIN_PASSWORD", default_value = "caddyLander")]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the default admin password is still in use
    Info,
    /// Manage the Caddyfile
    Caddyfile {
        #[command(subcommand)]
        action: DocumentAction,
    },
    /// Manage the landing-page content document
    Content {
        #[command(subcommand)]
        action: DocumentAction,
    },
    /// Derive landing-page links from the live Caddyfile
    Generate,
}

#[derive(Subcommand)]
enum DocumentAction {
    /// Print the live document
    Show,
    /// Replace the live document with a local file
    Submit { file: PathBuf },
    /// List stored backups, newest first
    Backups,
    /// Print a stored backup
    Backup { name: String },
    /// Restore a stored backup into the live slot
    Restore { name: String },
}

#[derive(Clone, Copy)]
enum Document {
    Caddyfile,
    Content,
}

impl Document {
    fn api(self) -> &'static str {
        match self {
            Document::Caddyfile => "caddyfile",
            Document::Content => "content",
        }
    }
}

struct Admin {
    client: reqwest::Client,
    url: String,
    password: String,
}

impl Admin {
    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.url, path))
            .basic_auth("admin", Some(&self.password))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.url, path))
            .basic_auth("admin", Some(&self.password))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let admin = Admin {
        client: reqwest::Client::new(),
        url: cli.url.trim_end_matches('/').to_string(),
        password: cli.password,
    };

    match cli.command {
        Commands::Info => print_json(admin.get("/api/admin/info").send().await?).await?,
        Commands::Generate => {
            print_json(admin.get("/api/admin/content/generate").send().await?).await?
        }
        Commands::Caddyfile { action } => run_action(&admin, Document::Caddyfile, action).await?,
        Commands::Content { action } => run_action(&admin, Document::Content, action).await?,
    }

    Ok(())
}

async fn run_action(
    admin: &Admin,
    doc: Document,
    action: DocumentAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = doc.api();
    match action {
        DocumentAction::Show => {
            let path = match doc {
                Document::Caddyfile => "/admin/caddyfile",
                Document::Content => "/api/content",
            };
            print_text(admin.get(path).send().await?).await
        }
        DocumentAction::Submit { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let res = match doc {
                Document::Caddyfile => admin.post("/admin/caddyfile").body(text).send().await?,
                Document::Content => {
                    admin
                        .post("/api/upload")
                        .form(&[("content", text)])
                        .send()
                        .await?
                }
            };
            print_json(res).await
        }
        DocumentAction::Backups => {
            print_json(admin.get(&format!("/api/admin/{}/backups", api)).send().await?).await
        }
        DocumentAction::Backup { name } => {
            let res = admin
                .get(&format!("/api/admin/{}/backup", api))
                .query(&[("name", name)])
                .send()
                .await?;
            print_text(res).await
        }
        DocumentAction::Restore { name } => {
            let res = admin
                .post(&format!("/api/admin/{}/restore", api))
                .json(&json!({ "name": name }))
                .send()
                .await?;
            print_json(res).await
        }
    }
}

/// Returns the body of a successful response, reporting failures on stderr.
async fn checked_body(res: reqwest::Response) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }
    Ok(Some(text))
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(text) = checked_body(res).await? {
        let json: Value = serde_json::from_str(&text)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(text) = checked_body(res).await? {
        print!("{}", text);
    }
    Ok(())
}
