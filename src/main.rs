use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sorturl::{cli, config, logging, types::AnalyticsRange, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage your account and session
    Auth(AuthOptions),

    /// Create a short URL
    Shorten(ShortenOptions),

    /// List and manage your short URLs
    Urls(UrlsOptions),

    /// Show per-day clicks for a short URL
    Analytics(AnalyticsOptions),

    /// Show totals and the 30-day click overview
    Dashboard,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthSubcommand {
    /// Create an account
    Register(RegisterOpts),

    /// Sign in and store the session
    Login(LoginOpts),

    /// Renew the stored session token now
    Refresh,

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored
    Status,
}

#[derive(Parser, Debug, Clone)]
pub struct RegisterOpts {
    #[clap(long)]
    pub name: String,
    #[clap(long)]
    pub email: String,
    #[clap(long)]
    pub password: String,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOpts {
    #[clap(long)]
    pub email: String,
    #[clap(long)]
    pub password: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ShortenOptions {
    /// The long URL to shorten
    pub url: String,
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "List and manage your short URLs",
    args_conflicts_with_subcommands = true // disallow mixing --search with subcommands
)]
pub struct UrlsOptions {
    /// Only show URLs whose short code or target contains this text
    #[clap(long)]
    pub search: Option<String>,

    #[command(subcommand)]
    pub command: Option<UrlsSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UrlsSubcommand {
    /// Copy the public link of a short URL to the clipboard
    Copy(ShortUrlOpts),

    /// Delete a short URL
    Delete(DeleteOpts),

    /// Open a short URL in the browser (counts as a click)
    Open(ShortUrlOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct ShortUrlOpts {
    pub short_url: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteOpts {
    pub short_url: String,

    /// Skip the confirmation prompt
    #[clap(long, short)]
    pub yes: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyticsOptions {
    pub short_url: String,

    /// Time window to show
    #[clap(long, value_enum, default_value_t = AnalyticsRange::Month)]
    pub range: AnalyticsRange,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Auth(opt) => match opt.command {
            AuthSubcommand::Register(r) => cli::register(r.name, r.email, r.password).await,
            AuthSubcommand::Login(l) => cli::login(l.email, l.password).await,
            AuthSubcommand::Refresh => cli::refresh().await,
            AuthSubcommand::Logout => cli::logout().await,
            AuthSubcommand::Status => cli::status().await,
        },

        Command::Shorten(opt) => cli::shorten(opt.url).await,

        Command::Urls(opt) => match opt.command {
            Some(UrlsSubcommand::Copy(c)) => cli::copy_url(c.short_url),
            Some(UrlsSubcommand::Delete(d)) => cli::delete_url(d.short_url, d.yes).await,
            Some(UrlsSubcommand::Open(o)) => cli::open_url(o.short_url),
            None => cli::list_urls(opt.search).await,
        },

        Command::Analytics(opt) => cli::analytics(opt.short_url, opt.range).await,
        Command::Dashboard => cli::dashboard().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
