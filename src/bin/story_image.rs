use anyhow::Result;
use clap::Parser;
use passforge::image::{self, HttpUpstream};
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "story-image",
    version,
    about = "Request an illustration for a passphrase scene prompt"
)]
struct Cli {
    /// Scene description; never pass the secret itself
    #[arg(short, long)]
    prompt: String,

    /// HTTP method to present to the handler
    #[arg(long, default_value = "POST", hide = true)]
    method: String,

    #[arg(long, env = image::API_KEY_VAR, hide_env_values = true)]
    api_key: Option<String>,

    /// Override the image API endpoint
    #[arg(long, default_value = image::IMAGES_ENDPOINT)]
    endpoint: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let upstream = HttpUpstream::new(cli.endpoint);
    let body = json!({ "prompt": cli.prompt });

    let response =
        image::handle_image_request(&cli.method, Some(&body), cli.api_key.as_deref(), &upstream);

    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.status != 200 {
        anyhow::bail!("Image request failed with status {}", response.status);
    }

    Ok(())
}
