use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// The request url,like http://httpbin.org/get
    pub url: Option<String>,
    /// Specify request method to use
    #[arg(short = 'X', long = "request", value_name = "method")]
    pub method_option: Option<String>,
    /// HTTP headers as JSON text or @file.json
    #[arg(short = 'H', long = "headers", value_name = "json/@file")]
    pub headers_option: Option<String>,
    /// Query parameters as JSON text or @file.json
    #[arg(short = 'q', long = "query", value_name = "json/@file")]
    pub query_option: Option<String>,
    /// HTTP request body as text or @file
    #[arg(short = 'd', long = "data", value_name = "data/@file")]
    pub body_option: Option<String>,
    /// Body type: json, text, form, js, html, xml, none
    #[arg(
        short = 't',
        long = "body-type",
        value_name = "type",
        default_value = "json"
    )]
    pub body_type: String,
    ///  Write response body to file instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "file")]
    pub file_path_option: Option<String>,
    ///  Send User-Agent <name> to server
    #[arg(short = 'A', long = "user-agent", value_name = "name")]
    pub user_agent_option: Option<String>,
    /// The Cookie option.
    #[arg(short = 'b', long = "cookie", value_name = "data")]
    pub cookie_option: Option<String>,
    /// The pem path.
    #[arg(short = 'c', long, value_name = "file")]
    pub certificate_path_option: Option<String>,
    /// Allow insecure server connections
    #[arg(short = 'k', long = "insecure")]
    pub skip_certificate_validate: bool,
    /// Disable the live progress display
    #[arg(long = "no-progress")]
    pub no_progress: bool,
    ///  Make the operation more talkative
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
    #[command(subcommand)]
    pub quick_cmd: Option<QuickCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QuickCommand {
    /// View request history
    History,
    /// Replay a request from history by ID
    Replay {
        /// The history entry id
        id: String,
    },
}
