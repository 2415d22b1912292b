mod config;
mod dispatcher;
mod error;
mod gemini;
mod llm_client;
mod logging;
mod prompt;
mod provider;
mod sse;
#[cfg(test)]
mod testing;

use clap::{Parser, ValueEnum};
use config::Config;
use dispatcher::{RequestDispatcher, RequestMode};
use error::Error;
use llm_client::GeminiClient;
use prompt::{ConversationHistory, Prompt, Turn};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{Instrument, Level, info, info_span};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "gemini-quickstart")]
#[command(about = "Text, image, chat and streaming calls against the Gemini API")]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Mode::Text)]
    mode: Mode,

    /// Replaces the built-in prompt (the new chat message in chat mode)
    #[arg(short, long)]
    prompt: Option<String>,

    /// Image file for image mode; repeat for several
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    #[arg(long)]
    model: Option<String>,

    /// Path to an optional YAML config file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long)]
    api_base: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[arg(long)]
    log_file: Option<String>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Text,
    Image,
    Chat,
    Stream,
}

const DEFAULT_IMAGES: [&str; 2] = ["onepiece01_luffy.png", "onepiece02_zoro_bandana.png"];

fn build_request(mode: Mode, prompt: Option<String>, images: Vec<PathBuf>) -> RequestMode {
    match mode {
        Mode::Text => RequestMode::TextOnly {
            prompt: Prompt::text(prompt.unwrap_or_else(|| "Who created ONE PIECE?".to_string())),
        },
        Mode::Image => RequestMode::TextAndImage {
            image_paths: if images.is_empty() {
                DEFAULT_IMAGES.iter().map(PathBuf::from).collect()
            } else {
                images
            },
            instruction: prompt
                .unwrap_or_else(|| "Tell me the differences between the two images.".to_string()),
        },
        Mode::Chat => RequestMode::Chat {
            history: ConversationHistory::new(vec![
                Turn::user("Hello, what red fruits are there?"),
                Turn::model("There are strawberries and apples."),
            ]),
            message: Prompt::text(prompt.unwrap_or_else(|| "Which of those is smaller?".to_string())),
        },
        Mode::Stream => RequestMode::Streaming {
            prompt: Prompt::text(prompt.unwrap_or_else(|| {
                "Explain the Devil Fruit that Monkey D. Luffy ate.".to_string()
            })),
        },
    }
}

fn load_config(args: &Args) -> Result<Config, Error> {
    let mut config = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Configuration loaded successfully from: {}", path);
            config
        }
        None => Config::default(),
    };
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(api_base) = &args.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(proxy) = &args.proxy {
        config.proxy = Some(proxy.clone());
    }
    Ok(config)
}

async fn run(args: Args) -> Result<(), Error> {
    let config = load_config(&args)?;
    let request_id = Uuid::new_v4().to_string();
    let client = GeminiClient::from_config(&config, |name| std::env::var(name).ok())?
        .with_request_id(request_id.clone());

    let request = build_request(args.mode, args.prompt, args.images);
    let span = info_span!("invocation", id = %request_id, mode = request.name(), model = client.model());
    let _stdout = RequestDispatcher::new(client, std::io::stdout().lock())
        .dispatch(request)
        .instrument(span)
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    if let Err(e) = logging::init_logging(log_level, args.log_file.as_deref()) {
        eprintln!("Error: cannot open log file: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
