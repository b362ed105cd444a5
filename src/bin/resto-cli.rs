use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

#[derive(Parser)]
#[command(name = "resto-cli")]
#[command(about = "Client for a running resto server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the documented routes
    Endpoints,
    /// Call one route and print the response
    Call {
        /// GET, POST, PUT, PATCH or DELETE
        method: String,
        /// Request path, e.g. /v1/note
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
        /// Bearer token
        #[arg(long, conflicts_with_all = ["user", "password"])]
        token: Option<String>,
        /// Basic auth user
        #[arg(long, requires = "password")]
        user: Option<String>,
        /// Basic auth password
        #[arg(long, requires = "user")]
        password: Option<String>,
        /// Query parameter as key=value, repeatable
        #[arg(short, long, value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Endpoints => {
            let res = client.get(format!("{}/endpoints", base)).send().await?;
            let doc: Value = res.error_for_status()?.json().await?;
            print_endpoints(&doc);
        }
        Commands::Call {
            method,
            path,
            data,
            token,
            user,
            password,
            query,
        } => {
            let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())?;
            let mut headers = HeaderMap::new();
            if let Some(token) = token {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
            } else if let (Some(user), Some(password)) = (user, password) {
                let encoded = STANDARD.encode(format!("{}:{}", user, password));
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Basic {}", encoded))?);
            }

            let mut request = client
                .request(method, format!("{}{}", base, path))
                .headers(headers)
                .query(&query);
            if let Some(data) = data {
                let body: Value = serde_json::from_str(&data)?;
                request = request.json(&body);
            }
            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

fn print_endpoints(doc: &Value) {
    if let Some(title) = doc["info"]["title"].as_str() {
        println!("{}", title);
    }
    let Some(paths) = doc["paths"].as_object() else {
        return;
    };
    for (path, operations) in paths {
        let Some(operations) = operations.as_object() else {
            continue;
        };
        for (method, operation) in operations {
            println!(
                "  {:<7} {:<30} {}",
                method.to_uppercase(),
                path,
                operation["summary"].as_str().unwrap_or_default()
            );
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if status.is_success() {
        println!("{}", status);
    } else {
        eprintln!("Error: server returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
