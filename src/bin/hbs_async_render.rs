//! Async Template Renderer CLI
//!
//! Renders one handlebars template file with async helpers enabled and prints
//! the result to stdout. The `fetch` helper is available to the template.
//!
//! Usage:
//!   cargo run --features cli --bin hbs_async_render -- \
//!     --template page.hbs \
//!     --data model.json \
//!     --timeout-ms 5000

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;

use hbs_async::{AsyncRenderer, RenderConfig, TIMEOUT_ENV};

/// Render a handlebars template, resolving async helpers
#[derive(Parser, Debug)]
#[command(name = "hbs_async_render")]
#[command(about = "Render a handlebars template with async helpers")]
struct Args {
    /// Template file; registered under its file stem
    #[arg(long, short = 't')]
    template: PathBuf,

    /// JSON file with the render model (default: empty object)
    #[arg(long, short = 'd')]
    data: Option<PathBuf>,

    /// Per-helper wait bound in milliseconds (0 = wait indefinitely)
    #[arg(long, env = TIMEOUT_ENV)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hbs_async=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = RenderConfig::from_env();
    if let Some(ms) = args.timeout_ms {
        config.timeout = (ms > 0).then_some(Duration::from_millis(ms));
    }

    let name = args
        .template
        .file_stem()
        .and_then(|s| s.to_str())
        .context("template path has no usable file name")?
        .to_string();
    let source = std::fs::read_to_string(&args.template)
        .with_context(|| format!("reading {}", args.template.display()))?;

    let model: Value = match &args.data {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Value::Object(Default::default()),
    };

    let mut renderer = AsyncRenderer::with_config(config);
    renderer.register_fetch_helper(reqwest::Client::new());
    renderer.register_template_string(&name, source)?;

    tracing::info!(template = %name, timeout = ?renderer.config().timeout, "Rendering");
    let output = renderer.render(&name, &model).await?;
    print!("{output}");

    Ok(())
}
