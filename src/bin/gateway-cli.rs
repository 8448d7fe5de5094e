use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Browse and fetch files from a file gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "GATEWAY_SECRET", hide_env_values = true)]
    password: String,

    /// Sent as the Basic username; the gateway ignores it.
    #[arg(long, default_value = "cli")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Download a file
    Get {
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Download a directory as a zip archive
    Zip {
        #[arg(default_value = "")]
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
struct Listing {
    path: String,
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct Item {
    name: String,
    is_dir: bool,
    size: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let (route, path, output) = match cli.command {
        Commands::Ls { path } => {
            let res = client
                .get(format!("{}/api/list", base))
                .query(&[("path", path.as_str())])
                .basic_auth(&cli.user, Some(&cli.password))
                .send()
                .await?;
            let res = check(res).await?;
            print_listing(&res.json::<Listing>().await?);
            return Ok(());
        }
        Commands::Get { path, output } => ("download", path, output),
        Commands::Zip { path, output } => ("download_zip", path, output),
    };

    let res = client
        .get(format!("{}/{}", base, route))
        .query(&[("path", path.as_str())])
        .basic_auth(&cli.user, Some(&cli.password))
        .send()
        .await?;
    let mut res = check(res).await?;

    let output = output.unwrap_or_else(|| {
        res.headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_name)
            .unwrap_or_else(|| "download".to_string())
            .into()
    });

    let mut file = tokio::fs::File::create(&output).await?;
    let mut written = 0u64;
    while let Some(chunk) = res.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    println!("{} ({} bytes)", output.display(), written);
    Ok(())
}

async fn check(res: reqwest::Response) -> Result<reqwest::Response, Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or(body);
    Err(format!("gateway returned {}: {}", status, message.trim()).into())
}

fn print_listing(listing: &Listing) {
    println!("{}", listing.path);
    for item in &listing.items {
        match (item.is_dir, item.size) {
            (true, _) => println!("  {:>12}  {}/", "-", item.name),
            (false, Some(size)) => println!("  {:>12}  {}", size, item.name),
            (false, None) => println!("  {:>12}  {}", "?", item.name),
        }
    }
}

/// Plain `filename="..."` from a Content-Disposition value, stripped to its
/// last path segment.
fn attachment_name(value: &str) -> Option<String> {
    let start = value.find("filename=\"")? + "filename=\"".len();
    let end = value[start..].find('"')? + start;
    let name = value[start..end].rsplit(['/', '\\']).next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}
