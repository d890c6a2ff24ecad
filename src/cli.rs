//! Command-line interface for Switchyard
//!
//! Argument parsing and subcommand definitions for the `switchyard` binary.

use crate::generation::TaskCategory;
use clap::{Parser, Subcommand, ValueEnum};

/// Multi-provider LLM generation router
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(version)]
#[command(about = "Multi-provider LLM generation router")]
#[command(
    long_about = "Switchyard spreads generation requests across hosted LLM providers in \
    round-robin order, honours each provider's per-minute budget, and fails over to the \
    next provider when one errors."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (default when no subcommand is given)
    Serve,

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List declared providers and whether their credentials resolve
    Providers,

    /// Run a single generation through the router and print the result
    Generate {
        /// Task category, selects each provider's logic or content model
        #[arg(long, value_enum, default_value_t = CategoryArg::Content)]
        category: CategoryArg,

        /// Ask providers for a JSON reply where supported
        #[arg(long)]
        json: bool,

        /// System instruction sent with the prompt
        #[arg(long)]
        system: Option<String>,

        /// Prompt text
        prompt: String,
    },
}

/// `--category` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Logic,
    Content,
}

impl From<CategoryArg> for TaskCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Logic => TaskCategory::Logic,
            CategoryArg::Content => TaskCategory::Content,
        }
    }
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Switchyard Configuration
# ========================
#
# HTTP server, LLM providers and observability settings.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Deadline for one /v1/generate call, across every failover attempt
request_timeout_seconds = 90

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# Requests rotate round-robin across every enabled provider. A provider is
# enabled when the environment variable named by api_key_env holds a
# non-empty value and disabled = false.
#
# Provider fields:
#   - name: Unique identifier (used in logs, metrics and /health)
#   - kind: gemini | anthropic | openai | groq | mistral | deepseek | openrouter
#   - api_key_env: Environment variable holding the API key
#   - requests_per_minute: Budget over a sliding 60s window (0 = never selected
#     unless every provider is over budget)
#   - priority: 1 = most preferred; only used when every provider is over budget
#   - logic_model / content_model: Model used for each task category
#   - base_url: Optional override of the vendor endpoint (no trailing slash)
#   - timeout_seconds: Per-call HTTP timeout (default 60)
#   - merge_system_into_user: Fold system text into the first user turn
#     (OpenAI-compatible models that reject system messages)
#   - default_max_tokens: Sent when the request has no max_tokens and the API
#     requires one (default 4096)
#   - disabled: Skip this provider even if its key is set

[[providers]]
name = "gemini"
kind = "gemini"
api_key_env = "GEMINI_API_KEY"
requests_per_minute = 15
priority = 1
logic_model = "gemini-2.0-flash"
content_model = "gemini-2.5-pro"

[[providers]]
name = "claude"
kind = "anthropic"
api_key_env = "ANTHROPIC_API_KEY"
requests_per_minute = 50
priority = 2
logic_model = "claude-3-5-haiku-latest"
content_model = "claude-sonnet-4-0"

[[providers]]
name = "groq"
kind = "groq"
api_key_env = "GROQ_API_KEY"
requests_per_minute = 30
priority = 3
logic_model = "llama-3.1-8b-instant"
content_model = "llama-3.3-70b-versatile"

# [[providers]]
# name = "openai"
# kind = "openai"
# api_key_env = "OPENAI_API_KEY"
# requests_per_minute = 60
# priority = 4
# logic_model = "gpt-4o-mini"
# content_model = "gpt-4o"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
