//! Multi-round research on top of the dispatcher.
//!
//! A planner model proposes searches, the dispatcher runs them, and the
//! findings feed the next round. A final turn writes the report.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{run_single_turn, AgentRequest, Message};
use crate::config::ResearchSettings;
use crate::credentials::Credentials;
use crate::dispatch::Dispatcher;
use crate::engines::{EngineId, Provider};
use crate::error::SearchError;
use crate::types::DEFAULT_NUM_RESULTS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelClass {
    Mini,
    #[default]
    Standard,
    Reasoning,
}

impl ModelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelClass::Mini => "mini",
            ModelClass::Standard => "standard",
            ModelClass::Reasoning => "reasoning",
        }
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelClass {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mini" => Ok(ModelClass::Mini),
            "standard" => Ok(ModelClass::Standard),
            "reasoning" => Ok(ModelClass::Reasoning),
            other => Err(SearchError::Config(format!(
                "unknown model class '{}' (expected one of: mini, standard, reasoning)",
                other
            ))),
        }
    }
}

/// Providers tried for the planner, most preferred first.
pub const PLANNER_PREFERENCE: [Provider; 5] = [
    Provider::Anthropic,
    Provider::OpenAi,
    Provider::Google,
    Provider::Xai,
    Provider::OpenRouter,
];

fn planner_model(provider: Provider, class: ModelClass) -> Option<&'static str> {
    use ModelClass::*;
    let model = match (provider, class) {
        (Provider::Anthropic, Mini) => "claude-3-5-haiku-latest",
        (Provider::Anthropic, Standard) => "claude-sonnet-4-20250514",
        (Provider::Anthropic, Reasoning) => "claude-opus-4-1-20250805",
        (Provider::OpenAi, Mini) => "gpt-4.1-mini",
        (Provider::OpenAi, Standard) => "gpt-4.1",
        (Provider::OpenAi, Reasoning) => "o3",
        (Provider::Google, Mini) => "gemini-2.5-flash-lite",
        (Provider::Google, Standard) => "gemini-2.5-flash",
        (Provider::Google, Reasoning) => "gemini-2.5-pro",
        (Provider::Xai, Mini) => "grok-3-mini",
        (Provider::Xai, Standard | Reasoning) => "grok-4",
        (Provider::OpenRouter, Mini) => "openai/gpt-4.1-mini",
        (Provider::OpenRouter, Standard) => "openai/gpt-4.1",
        (Provider::OpenRouter, Reasoning) => "openai/o3",
        (Provider::Brave, _) => return None,
    };
    Some(model)
}

/// One dispatcher invocation made during research.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    pub round: usize,
    pub engine: String,
    pub query: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Characters of output returned on success.
    pub output_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub report: String,
    pub rounds: usize,
    pub calls: Vec<ToolCallRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlannedSearch {
    engine: String,
    query: String,
    #[serde(default)]
    num_results: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Plan {
    #[serde(default)]
    searches: Vec<PlannedSearch>,
    #[serde(default)]
    done: bool,
}

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

/// Accepts a bare object, a fenced ```json block, or an object embedded in prose.
fn parse_plan(text: &str) -> Option<Plan> {
    let trimmed = text.trim();
    if let Ok(plan) = serde_json::from_str::<Plan>(trimmed) {
        return Some(plan);
    }
    if let Some(caps) = FENCED_JSON.captures(trimmed) {
        if let Ok(plan) = serde_json::from_str::<Plan>(&caps[1]) {
            return Some(plan);
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Plan>(&trimmed[start..=end]).ok()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("\n[truncated]");
    out
}

const PLANNER_INSTRUCTIONS: &str = "You plan web research. Reply with JSON only, no prose: \
{\"searches\":[{\"engine\":\"<engine>\",\"query\":\"<query>\",\"num_results\":5}],\"done\":false}. \
Use only the listed engines. Set \"done\" to true with an empty list once the findings answer the question.";

const WRITER_INSTRUCTIONS: &str = "You write research reports in markdown. \
Use headings and short paragraphs, cite sources inline by URL, and end with a Sources list. \
Only state what the findings support.";

struct Planner {
    provider: Provider,
    model: &'static str,
    api_key: String,
}

impl Planner {
    fn pick(credentials: &Credentials, class: ModelClass) -> Option<Self> {
        PLANNER_PREFERENCE.iter().find_map(|provider| {
            let api_key = credentials.get(*provider)?;
            Some(Planner {
                provider: *provider,
                model: planner_model(*provider, class)?,
                api_key: api_key.to_string(),
            })
        })
    }

    fn request(&self, name: &str, instructions: &str, prompt: String) -> AgentRequest {
        AgentRequest {
            provider: self.provider,
            api_key: self.api_key.clone(),
            model: self.model.to_string(),
            name: name.to_string(),
            description: "Research orchestration".to_string(),
            instructions: instructions.to_string(),
            messages: vec![Message::user(prompt)],
            signal_tool: None,
            max_results: None,
            caller_agent_id: None,
        }
    }
}

pub struct ResearchTask<'a> {
    dispatcher: &'a Dispatcher,
    model_class: ModelClass,
    settings: ResearchSettings,
}

impl<'a> ResearchTask<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self {
            dispatcher,
            model_class: ModelClass::default(),
            settings: dispatcher.config().research.clone(),
        }
    }

    pub fn with_model_class(mut self, class: ModelClass) -> Self {
        self.model_class = class;
        self
    }

    pub fn with_settings(mut self, settings: ResearchSettings) -> Self {
        self.settings = settings;
        self
    }

    fn engines(&self, credentials: &Credentials) -> Vec<EngineId> {
        credentials
            .enabled_engines()
            .into_iter()
            .filter(|id| {
                self.settings.default_engines.is_empty()
                    || self
                        .settings
                        .default_engines
                        .iter()
                        .any(|name| name == id.as_str())
            })
            .collect()
    }

    pub async fn run(&self, query: &str) -> Result<ResearchReport, SearchError> {
        let credentials = self.dispatcher.credentials();
        let planner = Planner::pick(&credentials, self.model_class).ok_or_else(|| {
            SearchError::Agent("No LLM provider configured for research tasks.".into())
        })?;
        let engines = self.engines(&credentials);
        if engines.is_empty() {
            return Err(SearchError::NoEnginesConfigured);
        }
        info!(
            planner = %planner.provider,
            model = planner.model,
            engines = engines.len(),
            class = %self.model_class,
            "starting research"
        );

        let mut notes: Vec<String> = Vec::new();
        let mut calls: Vec<ToolCallRecord> = Vec::new();
        let mut rounds = 0;

        for round in 1..=self.settings.max_rounds {
            let prompt = planning_prompt(query, &engines, &notes, round, self.settings.searches_per_round);
            let reply = run_single_turn(
                self.dispatcher.agent(),
                planner.request("Research Planner", PLANNER_INSTRUCTIONS, prompt),
            )
            .await?;

            let plan = match parse_plan(&reply) {
                Some(plan) => plan,
                None if round == 1 => {
                    warn!("planner reply was not a plan; searching the question directly");
                    Plan {
                        searches: vec![PlannedSearch {
                            engine: engines[0].as_str().to_string(),
                            query: query.to_string(),
                            num_results: None,
                        }],
                        done: false,
                    }
                }
                None => {
                    warn!(round, "planner reply was not a plan; stopping");
                    break;
                }
            };
            rounds = round;

            if plan.searches.is_empty() {
                debug!(round, "planner has nothing left to search");
                break;
            }

            let searches: Vec<PlannedSearch> = plan
                .searches
                .into_iter()
                .take(self.settings.searches_per_round.max(1))
                .collect();
            let results = self.execute(round, searches, &engines).await;
            for (record, output) in results {
                let body = match (&output, &record.error) {
                    (Some(text), _) => truncate_chars(text, self.settings.max_result_chars),
                    (None, Some(err)) => err.clone(),
                    (None, None) => String::new(),
                };
                notes.push(format!("### [{}] {}\n{}", record.engine, record.query, body));
                calls.push(record);
            }

            if plan.done {
                break;
            }
        }

        let report = run_single_turn(
            self.dispatcher.agent(),
            planner.request("Research Writer", WRITER_INSTRUCTIONS, synthesis_prompt(query, &notes)),
        )
        .await?;

        info!(rounds, calls = calls.len(), "research finished");
        Ok(ResearchReport {
            report,
            rounds,
            calls,
        })
    }

    /// Run one round's searches, at most `max_parallel` at a time, in plan order.
    async fn execute(
        &self,
        round: usize,
        searches: Vec<PlannedSearch>,
        engines: &[EngineId],
    ) -> Vec<(ToolCallRecord, Option<String>)> {
        let dispatcher = self.dispatcher;
        stream::iter(searches.into_iter().map(|search| async move {
            let started_at = Utc::now();
            let clock = Instant::now();
            let allowed = search
                .engine
                .parse::<EngineId>()
                .ok()
                .filter(|id| engines.contains(id));

            let outcome = match allowed {
                Some(id) => {
                    dispatcher
                        .dispatch(
                            id.as_str(),
                            &search.query,
                            search.num_results.unwrap_or(DEFAULT_NUM_RESULTS),
                            None,
                        )
                        .await
                        .and_then(|payload| payload.to_wire())
                }
                None => Err(match search.engine.parse::<EngineId>() {
                    Err(e) => e,
                    Ok(_) => SearchError::Agent(format!(
                        "Engine {} is not enabled for research",
                        search.engine
                    )),
                }),
            };

            let duration_ms = clock.elapsed().as_millis() as u64;
            let (ok, error, output) = match outcome {
                Ok(text) => (true, None, Some(text)),
                Err(e) => (false, Some(e.to_string()), None),
            };
            let record = ToolCallRecord {
                round,
                engine: search.engine,
                query: search.query,
                started_at,
                duration_ms,
                ok,
                error,
                output_chars: output.as_ref().map(|t| t.chars().count()).unwrap_or(0),
            };
            (record, output)
        }))
        .buffered(self.settings.max_parallel.max(1))
        .collect()
        .await
    }
}

fn planning_prompt(
    query: &str,
    engines: &[EngineId],
    notes: &[String],
    round: usize,
    per_round: usize,
) -> String {
    let mut prompt = format!("Question: {}\n\nRound {}. Available engines:\n", query, round);
    for id in engines {
        prompt.push_str(&format!("- {}: {}\n", id, id.descriptor().description));
    }
    prompt.push_str(&format!(
        "\nPlan at most {} searches for this round.\n",
        per_round.max(1)
    ));
    if notes.is_empty() {
        prompt.push_str("\nNo findings yet.");
    } else {
        prompt.push_str("\nFindings so far:\n\n");
        prompt.push_str(&notes.join("\n\n"));
    }
    prompt
}

fn synthesis_prompt(query: &str, notes: &[String]) -> String {
    if notes.is_empty() {
        return format!(
            "Question: {}\n\nNo search results were gathered. Say so briefly and answer only what can be stated without sources.",
            query
        );
    }
    format!(
        "Question: {}\n\nWrite the report from these findings:\n\n{}",
        query,
        notes.join("\n\n")
    )
}
