//! The fixed engine table.
//!
//! Both the capability registry and the dispatcher read from [`ENGINES`], so
//! adding an engine means adding one row here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agent::SignalTool;
use crate::credentials::Credentials;
use crate::error::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineId {
    Brave,
    BraveImages,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Google,
    Sonar,
    SonarPro,
    SonarDeepResearch,
    Xai,
}

impl EngineId {
    /// Canonical order, used for listings and tool enums.
    pub const ALL: [EngineId; 9] = [
        EngineId::Brave,
        EngineId::BraveImages,
        EngineId::Anthropic,
        EngineId::OpenAi,
        EngineId::Google,
        EngineId::Sonar,
        EngineId::SonarPro,
        EngineId::SonarDeepResearch,
        EngineId::Xai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::Brave => "brave",
            EngineId::BraveImages => "brave-images",
            EngineId::Anthropic => "anthropic",
            EngineId::OpenAi => "openai",
            EngineId::Google => "google",
            EngineId::Sonar => "sonar",
            EngineId::SonarPro => "sonar-pro",
            EngineId::SonarDeepResearch => "sonar-deep-research",
            EngineId::Xai => "xai",
        }
    }

    pub fn descriptor(&self) -> &'static EngineDescriptor {
        // ENGINES is laid out in ALL order
        &ENGINES[*self as usize]
    }

    pub fn provider(&self) -> Provider {
        self.descriptor().provider
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| SearchError::UnknownEngine(s.to_string()))
    }
}

/// A credential holder. One provider can unlock several engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Brave,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Google,
    Xai,
    OpenRouter,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::Brave,
        Provider::Anthropic,
        Provider::OpenAi,
        Provider::Google,
        Provider::Xai,
        Provider::OpenRouter,
    ];

    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Brave => "BRAVE_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
            Provider::Xai => "XAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Name used in "API key not configured" messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Brave => "Brave",
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
            Provider::Google => "Google",
            Provider::Xai => "xAI",
            Provider::OpenRouter => "OpenRouter",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraveVertical {
    Web,
    Images,
}

/// Model-side parameters for engines reached through an agent turn.
#[derive(Debug, Clone, Copy)]
pub struct AgentSpec {
    pub model: &'static str,
    pub display_name: &'static str,
    pub instructions: &'static str,
    pub signal_tool: Option<SignalTool>,
}

#[derive(Debug, Clone, Copy)]
pub enum TransportKind {
    DirectHttp(BraveVertical),
    LlmAgent(AgentSpec),
}

#[derive(Debug, Clone, Copy)]
pub struct EngineDescriptor {
    pub id: EngineId,
    pub provider: Provider,
    pub description: &'static str,
    pub transport: TransportKind,
}

const SEARCH_INSTRUCTIONS: &str = "Search the web for the user's query and answer with the most relevant, current findings. \
List each source as a markdown bullet with its title, URL and a one-sentence summary. \
Do not invent sources; if nothing relevant is found, say so.";

const DEEP_RESEARCH_INSTRUCTIONS: &str = "Research the user's query in depth using live web sources. \
Produce a structured report with headings, key findings and a final list of cited URLs.";

const WEB_SEARCH_SIGNAL: SignalTool = SignalTool {
    name: "web_search",
    description: "Search the live web and ground the answer in current sources.",
};

pub static ENGINES: [EngineDescriptor; 9] = [
    EngineDescriptor {
        id: EngineId::Brave,
        provider: Provider::Brave,
        description: "Brave Search web results (title, url, snippet) for general keyword queries.",
        transport: TransportKind::DirectHttp(BraveVertical::Web),
    },
    EngineDescriptor {
        id: EngineId::BraveImages,
        provider: Provider::Brave,
        description: "Brave Search image results (title, url, thumbnail, source, dimensions).",
        transport: TransportKind::DirectHttp(BraveVertical::Images),
    },
    EngineDescriptor {
        id: EngineId::Anthropic,
        provider: Provider::Anthropic,
        description: "Claude with web search; returns a written answer with cited sources.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "claude-sonnet-4-20250514",
            display_name: "Anthropic",
            instructions: SEARCH_INSTRUCTIONS,
            signal_tool: Some(WEB_SEARCH_SIGNAL),
        }),
    },
    EngineDescriptor {
        id: EngineId::OpenAi,
        provider: Provider::OpenAi,
        description: "OpenAI Responses API with web search; good for current events and summaries.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "gpt-4.1",
            display_name: "OpenAI",
            instructions: SEARCH_INSTRUCTIONS,
            signal_tool: Some(WEB_SEARCH_SIGNAL),
        }),
    },
    EngineDescriptor {
        id: EngineId::Google,
        provider: Provider::Google,
        description: "Gemini grounded with Google Search; broad coverage and fresh results.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "gemini-2.5-flash",
            display_name: "Google",
            instructions: SEARCH_INSTRUCTIONS,
            signal_tool: Some(WEB_SEARCH_SIGNAL),
        }),
    },
    EngineDescriptor {
        id: EngineId::Sonar,
        provider: Provider::OpenRouter,
        description: "Perplexity Sonar; fast search-grounded answers with citations.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "perplexity/sonar",
            display_name: "Perplexity Sonar",
            instructions: SEARCH_INSTRUCTIONS,
            signal_tool: None,
        }),
    },
    EngineDescriptor {
        id: EngineId::SonarPro,
        provider: Provider::OpenRouter,
        description: "Perplexity Sonar Pro; more sources and deeper answers for complex queries.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "perplexity/sonar-pro",
            display_name: "Perplexity Sonar Pro",
            instructions: SEARCH_INSTRUCTIONS,
            signal_tool: None,
        }),
    },
    EngineDescriptor {
        id: EngineId::SonarDeepResearch,
        provider: Provider::OpenRouter,
        description: "Perplexity Sonar Deep Research; slow, exhaustive multi-source reports.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "perplexity/sonar-deep-research",
            display_name: "Perplexity Sonar Deep Research",
            instructions: DEEP_RESEARCH_INSTRUCTIONS,
            signal_tool: None,
        }),
    },
    EngineDescriptor {
        id: EngineId::Xai,
        provider: Provider::Xai,
        description: "Grok with live search over the web and X posts.",
        transport: TransportKind::LlmAgent(AgentSpec {
            model: "grok-4",
            display_name: "xAI",
            instructions: SEARCH_INSTRUCTIONS,
            signal_tool: Some(WEB_SEARCH_SIGNAL),
        }),
    },
];

/// One line per enabled engine, in canonical order.
pub fn engine_descriptions(credentials: &Credentials) -> Vec<(EngineId, &'static str)> {
    credentials
        .enabled_engines()
        .into_iter()
        .map(|id| (id, id.descriptor().description))
        .collect()
}
