use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "supportchat")]
#[command(about = "Customer-support chat backed by an LLM and an MCP tool server", long_about = None)]
pub struct Args {
    #[arg(short = 's', long = "session", help = "Session id to continue (a new one is generated otherwise)")]
    pub session: Option<String>,

    #[arg(long = "stream", help = "Stream the answer as it is generated")]
    pub stream: bool,

    #[arg(short = 'v', long = "verbose", help = "Log requests and tool calls to stderr")]
    pub verbose: bool,

    #[arg(long = "server-url", help = "MCP tool server URL (overrides MCP_SERVER_URL)")]
    pub server_url: Option<String>,

    #[arg(
        long = "api-base-url",
        help = "OpenAI-compatible API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_base_url: Option<String>,

    #[arg(short = 'm', long = "model", help = "Model name (overrides AI_MODEL)")]
    pub model: Option<String>,

    #[arg(
        long = "max-tool-iterations",
        help = "Maximum model/tool round trips per turn"
    )]
    pub max_tool_iterations: Option<usize>,

    #[arg(help = "Message to send; starts an interactive session when omitted")]
    pub message: Vec<String>,
}

impl Args {
    /// The one-shot message, if any words were given.
    pub fn one_shot_message(&self) -> Option<String> {
        if self.message.is_empty() {
            None
        } else {
            Some(self.message.join(" "))
        }
    }
}
