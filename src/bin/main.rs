use clap::Parser;
use color_eyre::{eyre, Result};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;
use zulip_share::api::ZulipClient;
use zulip_share::app::App;
use zulip_share::backend::Session;
use zulip_share::config::Config;
use zulip_share::share::{handle_intent, Lifecycle, MimeGuessResolver, ShareAction, ShareIntent};
use zulip_share::utils::{get_config_dir, get_data_dir, initialize_panic_handler};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Share text and files to Zulip.
///
/// If an instance is already running, the share is handed to it and this
/// process exits.
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Development mode
    #[arg(short, long)]
    dev: bool,
    /// Kind of share event. Inferred from the number of files if omitted.
    #[arg(short, long, value_enum)]
    action: Option<ShareAction>,
    /// Declared MIME type of the shared content.
    #[arg(short = 't', long = "type")]
    mime_type: Option<String>,
    /// Text to share.
    #[arg(long)]
    text: Option<String>,
    /// File to share. May be repeated.
    #[arg(short, long)]
    stream: Vec<String>,
}

impl Args {
    fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            Ok(path.clone())
        } else {
            Self::default_config_path()
        }
    }
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = get_config_dir()?;
        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("zulip-share.config.toml"))
    }
    fn intent(&self) -> Option<ShareIntent> {
        if self.action.is_none() && self.text.is_none() && self.stream.is_empty() {
            return None;
        }
        Some(ShareIntent::from_args(
            self.action,
            self.mime_type.clone(),
            self.text.clone(),
            self.stream.clone(),
        ))
    }
}

/// The terminal is taken by the UI, so logs go to a file.
fn init_logger() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        return Ok(());
    }
    let data_dir = get_data_dir()?;
    fs::create_dir_all(&data_dir)?;
    let file = File::create(data_dir.join("zulip-share.log"))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger()?;

    let intent = args.intent();
    let resolver = Arc::new(MimeGuessResolver);
    #[cfg(unix)]
    let socket_path = zulip_share::ipc::socket_path()?;
    #[cfg(unix)]
    if let Some(intent) = &intent {
        if zulip_share::ipc::forward(&socket_path, intent, resolver.as_ref()).await? {
            println!("Shared to the running instance.");
            return Ok(());
        }
    }

    let mut config: Config = if args.config_path()?.exists() {
        toml::from_str(&fs::read_to_string(args.config_path()?)?)?
    } else {
        Config::default()
    };
    config.set_default_keybindings();
    config.dev |= args.dev;

    let Some(auth) = config.server.clone() else {
        return Err(eyre::eyre!(
            "no [server] section in {}",
            args.config_path()?.display()
        ));
    };

    initialize_panic_handler()?;

    let lifecycle = Arc::new(Lifecycle::default());
    if let Some(intent) = &intent {
        // not running yet, so this lands in the pending slot
        handle_intent(intent, resolver.as_ref(), &lifecycle);
    }
    #[cfg(unix)]
    let _listener = match zulip_share::ipc::Listener::bind(
        socket_path,
        lifecycle.clone(),
        resolver.clone(),
    ) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log::warn!("failed to listen for forwarded shares: {e}");
            None
        }
    };

    let session = Session::new(Arc::new(ZulipClient::new()?), auth);
    App::new(config, session, lifecycle).run().await
}
