//! Natural-language query parsing: `+key:value` modifiers, whole-query
//! templates, and free-text passes (time phrases, topics, owners,
//! priority words) (§4.8).

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MODIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+(\w+):(\S+)").unwrap());
static TIME_PHRASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"last\s+(\d+)\s*(day|hour|week|min(?:ute)?)s?").unwrap());
static AT_MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)").unwrap());
static POSSESSIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)'s work").unwrap());

static TEMPLATE_PATTERNS: Lazy<Vec<(Regex, Template)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"stand\s*-?up").unwrap(), Template::DailyStandup),
        (Regex::new(r"error|incident|investigat").unwrap(), Template::ErrorInvestigation),
        (Regex::new(r"feature progress|feature status").unwrap(), Template::FeatureProgress),
        (Regex::new(r"code review|review (pr|pull request)").unwrap(), Template::CodeReview),
        (Regex::new(r"retro(spective)?").unwrap(), Template::Retrospective),
        (Regex::new(r"performance|latency|slow").unwrap(), Template::PerformanceAnalysis),
        (Regex::new(r"security audit|vulnerabilit").unwrap(), Template::SecurityAudit),
        (Regex::new(r"deploy(ment)? readiness|ready to ship").unwrap(), Template::DeploymentReadiness),
    ]
});

/// Sort order requested for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Time,
    Score,
    Relevance,
}

/// Output shape requested for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Full,
    Summary,
    Ids,
}

/// Grouping axis requested for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Frame,
    Time,
    Owner,
    Topic,
}

/// Normalized structured query produced by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpretedQuery {
    pub free_text: String,
    #[serde(default)]
    pub time_last: Option<String>,
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub group_by: Option<GroupBy>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub original: String,
    pub interpreted: InterpretedQuery,
    /// `interpreted.topics` widened by synonym expansion; superset-or-equal
    /// to the interpreted set.
    pub expanded_topics: Vec<String>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// `parse(text) -> ParsedQuery`. Never raises; malformed modifiers become
/// validation errors on the returned value (§4.8, §7).
pub fn parse(text: &str) -> ParsedQuery {
    let mut interpreted = InterpretedQuery::default();
    let mut errors = Vec::new();

    if let Some(template) = match_template(text) {
        apply_template(template, text, &mut interpreted);
    }

    let (free_text, modifiers) = extract_modifiers(text);
    apply_modifiers(&modifiers, &mut interpreted, &mut errors);
    apply_natural_language_passes(&free_text, &mut interpreted);
    interpreted.free_text = free_text.trim().to_string();

    validate(&interpreted, &mut errors);
    let expanded_topics = expand_topics(&interpreted.topics);

    ParsedQuery { original: text.to_string(), interpreted, expanded_topics, validation_errors: errors, suggestions: Vec::new() }
}

/// Canonical text form of a parsed query: free text plus every interpreted
/// field re-expressed as an explicit `+key:value` modifier. `parse` applied
/// to this output reproduces the same `interpreted` fields regardless of
/// which pass (template, modifier, natural-language) originally derived
/// them, which is what makes `parse ∘ format ∘ parse` idempotent (§8).
pub fn format(parsed: &ParsedQuery) -> String {
    let q = &parsed.interpreted;
    let mut parts = vec![q.free_text.clone()];

    if let Some(last) = &q.time_last {
        parts.push(format!("+last:{last}"));
    }
    if let Some(since) = &q.since {
        parts.push(format!("+since:{since}"));
    }
    if let Some(until) = &q.until {
        parts.push(format!("+until:{until}"));
    }
    for owner in &q.owners {
        parts.push(format!("+owner:{owner}"));
    }
    if let Some(team) = &q.team {
        parts.push(format!("+team:{team}"));
    }
    for topic in &q.topics {
        parts.push(format!("+topic:{topic}"));
    }
    for file in &q.files {
        parts.push(format!("+file:{file}"));
    }
    if let Some(sort) = q.sort {
        let value = match sort {
            SortKey::Time => "time",
            SortKey::Score => "score",
            SortKey::Relevance => "relevance",
        };
        parts.push(format!("+sort:{value}"));
    }
    if let Some(limit) = q.limit {
        parts.push(format!("+limit:{limit}"));
    }
    if let Some(fmt) = q.format {
        let value = match fmt {
            OutputFormat::Full => "full",
            OutputFormat::Summary => "summary",
            OutputFormat::Ids => "ids",
        };
        parts.push(format!("+format:{value}"));
    }
    if let Some(group) = q.group_by {
        let value = match group {
            GroupBy::Frame => "frame",
            GroupBy::Time => "time",
            GroupBy::Owner => "owner",
            GroupBy::Topic => "topic",
        };
        parts.push(format!("+group:{value}"));
    }
    if let Some(status) = &q.status {
        parts.push(format!("+status:{status}"));
    }
    if let Some(word) = priority_window_name(q.priority_range) {
        parts.push(format!("+priority:{word}"));
    }

    parts.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

fn priority_window_name(window: Option<(f64, f64)>) -> Option<&'static str> {
    match window {
        Some((0.8, 1.0)) => Some("critical"),
        Some((0.7, 1.0)) => Some("high"),
        Some((0.4, 0.7)) => Some("medium"),
        Some((0.0, 0.3)) => Some("low"),
        _ => None,
    }
}

// --- +key:value modifier grammar -------------------------------------------

fn extract_modifiers(text: &str) -> (String, BTreeMap<String, String>) {
    let mut modifiers = BTreeMap::new();
    for caps in MODIFIER_RE.captures_iter(text) {
        modifiers.insert(caps[1].to_lowercase(), caps[2].to_string());
    }
    let free_text = MODIFIER_RE.replace_all(text, "").to_string();
    (free_text, modifiers)
}

fn apply_modifiers(modifiers: &BTreeMap<String, String>, interpreted: &mut InterpretedQuery, errors: &mut Vec<String>) {
    for (key, value) in modifiers {
        match key.as_str() {
            "last" => interpreted.time_last = Some(value.clone()),
            "since" => interpreted.since = Some(value.clone()),
            "until" => interpreted.until = Some(value.clone()),
            "owner" => interpreted.owners.push(value.clone()),
            "team" => interpreted.team = Some(value.clone()),
            "topic" => interpreted.topics.push(value.to_lowercase()),
            "file" => interpreted.files.push(value.clone()),
            "sort" => match value.as_str() {
                "time" => interpreted.sort = Some(SortKey::Time),
                "score" => interpreted.sort = Some(SortKey::Score),
                "relevance" => interpreted.sort = Some(SortKey::Relevance),
                other => errors.push(format!("unrecognized sort value '{other}'")),
            },
            "limit" => match value.parse::<i64>() {
                Ok(n) if n > 0 && n <= 1000 => interpreted.limit = Some(n as u32),
                Ok(n) => errors.push(format!("limit {n} out of range (1..=1000)")),
                Err(_) => errors.push(format!("limit '{value}' is not an integer")),
            },
            "format" => match value.as_str() {
                "full" => interpreted.format = Some(OutputFormat::Full),
                "summary" => interpreted.format = Some(OutputFormat::Summary),
                "ids" => interpreted.format = Some(OutputFormat::Ids),
                other => errors.push(format!("unrecognized format value '{other}'")),
            },
            "group" => match value.as_str() {
                "frame" => interpreted.group_by = Some(GroupBy::Frame),
                "time" => interpreted.group_by = Some(GroupBy::Time),
                "owner" => interpreted.group_by = Some(GroupBy::Owner),
                "topic" => interpreted.group_by = Some(GroupBy::Topic),
                other => errors.push(format!("unrecognized group value '{other}'")),
            },
            "status" => interpreted.status = Some(value.clone()),
            "priority" => match priority_window(value) {
                Some(window) => interpreted.priority_range = Some(window),
                None => errors.push(format!("unrecognized priority '{value}'")),
            },
            other => errors.push(format!("unrecognized modifier key '{other}'")),
        }
    }
}

fn priority_window(word: &str) -> Option<(f64, f64)> {
    match word {
        "critical" => Some((0.8, 1.0)),
        "high" => Some((0.7, 1.0)),
        "medium" => Some((0.4, 0.7)),
        "low" => Some((0.0, 0.3)),
        _ => None,
    }
}

// --- whole-query templates ---------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Template {
    DailyStandup,
    ErrorInvestigation,
    FeatureProgress,
    CodeReview,
    Retrospective,
    PerformanceAnalysis,
    SecurityAudit,
    DeploymentReadiness,
}

fn match_template(text: &str) -> Option<Template> {
    let lower = text.to_lowercase();
    TEMPLATE_PATTERNS.iter().find(|(re, _)| re.is_match(&lower)).map(|(_, template)| *template)
}

fn apply_template(template: Template, text: &str, interpreted: &mut InterpretedQuery) {
    match template {
        Template::DailyStandup => {
            interpreted.time_last = Some("24h".to_string());
            interpreted.group_by = Some(GroupBy::Frame);
            if let Some(owner) = extract_name_after("for", text) {
                interpreted.owners.push(owner);
            }
        }
        Template::ErrorInvestigation => {
            interpreted.topics.push("error".to_string());
            interpreted.sort = Some(SortKey::Time);
        }
        Template::FeatureProgress => {
            interpreted.status = Some("in_progress".to_string());
            interpreted.group_by = Some(GroupBy::Topic);
        }
        Template::CodeReview => {
            interpreted.topics.push("review".to_string());
            interpreted.sort = Some(SortKey::Time);
        }
        Template::Retrospective => {
            interpreted.time_last = Some("7d".to_string());
            interpreted.group_by = Some(GroupBy::Time);
        }
        Template::PerformanceAnalysis => {
            interpreted.topics.push("performance".to_string());
        }
        Template::SecurityAudit => {
            interpreted.topics.push("security".to_string());
            interpreted.priority_range = Some((0.7, 1.0));
        }
        Template::DeploymentReadiness => {
            interpreted.status = Some("closed".to_string());
            interpreted.group_by = Some(GroupBy::Frame);
        }
    }
}

fn extract_name_after<'a>(anchor: &str, text: &'a str) -> Option<String> {
    let lower = text.to_lowercase();
    let idx = lower.find(anchor)?;
    let rest = text[idx + anchor.len()..].trim();
    rest.split_whitespace().next().map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
}

// --- natural-language passes ---------------------------------------------

fn apply_natural_language_passes(free_text: &str, interpreted: &mut InterpretedQuery) {
    apply_time_phrases(free_text, interpreted);
    apply_owner_mentions(free_text, interpreted);
    apply_topic_dictionary(free_text, interpreted);
    apply_priority_words(free_text, interpreted);
}

fn apply_time_phrases(text: &str, interpreted: &mut InterpretedQuery) {
    if interpreted.time_last.is_some() {
        return;
    }
    let lower = text.to_lowercase();
    if let Some(caps) = TIME_PHRASE_RE.captures(&lower) {
        let n: u32 = caps[1].parse().unwrap_or(1);
        let unit = match &caps[2] {
            "day" => "d",
            "hour" => "h",
            "week" => "w",
            _ => "m",
        };
        interpreted.time_last = Some(format!("{n}{unit}"));
    } else if lower.contains("today") {
        interpreted.time_last = Some("24h".to_string());
    } else if lower.contains("yesterday") {
        interpreted.time_last = Some("48h".to_string());
    } else if lower.contains("this week") {
        interpreted.time_last = Some("7d".to_string());
    }
}

fn apply_owner_mentions(text: &str, interpreted: &mut InterpretedQuery) {
    for caps in AT_MENTION_RE.captures_iter(text) {
        interpreted.owners.push(caps[1].to_lowercase());
    }
    if let Some(caps) = POSSESSIVE_RE.captures(text) {
        interpreted.owners.push(caps[1].to_lowercase());
    }
    interpreted.owners.sort();
    interpreted.owners.dedup();
}

const TOPIC_DICTIONARY: &[&str] = &["bug", "feature", "auth", "performance", "security", "refactor", "test", "deploy", "error", "review"];

fn apply_topic_dictionary(text: &str, interpreted: &mut InterpretedQuery) {
    let tokens = framestack_core::tokenize(text);
    for token in tokens {
        let singular = normalize_plural(&token);
        if TOPIC_DICTIONARY.contains(&singular.as_str()) {
            interpreted.topics.push(singular);
        }
    }
    interpreted.topics.sort();
    interpreted.topics.dedup();
}

/// Crude plural normalization sufficient for the fixed topic dictionary:
/// `bugs` -> `bug`, `features` -> `feature`.
fn normalize_plural(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('s') {
        if TOPIC_DICTIONARY.contains(&stem) {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn apply_priority_words(text: &str, interpreted: &mut InterpretedQuery) {
    if interpreted.priority_range.is_some() {
        return;
    }
    let lower = text.to_lowercase();
    for word in ["critical", "high", "medium", "low"] {
        if lower.contains(word) {
            interpreted.priority_range = priority_window(word);
            break;
        }
    }
}

/// Synonym expansion: widens a topic set, never narrows it (§8 round-trip
/// law: monotone superset of the original).
fn expand_topics(topics: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = topics.to_vec();
    for topic in topics {
        if topic == "auth" {
            for synonym in ["authentication", "oauth", "login", "session", "jwt"] {
                expanded.push(synonym.to_string());
            }
        }
    }
    expanded.sort();
    expanded.dedup();
    expanded
}

fn validate(interpreted: &InterpretedQuery, errors: &mut Vec<String>) {
    if let (Some(since), Some(until)) = (&interpreted.since, &interpreted.until) {
        if since > until {
            errors.push("time window inverted: since is after until".to_string());
        }
    }
    if let Some((low, high)) = interpreted.priority_range {
        if low > high {
            errors.push("priority range inverted".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standup_template_fills_last_24h_and_owner() {
        let parsed = parse("standup for alice");
        assert_eq!(parsed.interpreted.time_last.as_deref(), Some("24h"));
        assert!(parsed.interpreted.owners.contains(&"alice".to_string()));
        assert_eq!(parsed.interpreted.group_by, Some(GroupBy::Frame));
        assert!(parsed.validation_errors.is_empty());
    }

    #[test]
    fn modifier_grammar_parses_limit_and_sort() {
        let parsed = parse("database issues +sort:score +limit:20");
        assert_eq!(parsed.interpreted.sort, Some(SortKey::Score));
        assert_eq!(parsed.interpreted.limit, Some(20));
        assert_eq!(parsed.interpreted.free_text, "database issues");
    }

    #[test]
    fn limit_out_of_range_becomes_a_validation_error_not_a_panic() {
        let parsed = parse("+limit:5000");
        assert!(!parsed.validation_errors.is_empty());
    }

    #[test]
    fn at_mention_and_possessive_both_populate_owners() {
        let parsed = parse("@bob and alice's work on login");
        assert!(parsed.interpreted.owners.contains(&"bob".to_string()));
        assert!(parsed.interpreted.owners.contains(&"alice".to_string()));
    }

    #[test]
    fn plural_topic_collapses_to_singular() {
        let parsed = parse("recent bugs in the payment flow");
        assert!(parsed.interpreted.topics.contains(&"bug".to_string()));
    }

    #[test]
    fn synonym_expansion_is_a_superset_of_interpreted_topics() {
        let parsed = parse("+topic:auth");
        for topic in &parsed.interpreted.topics {
            assert!(parsed.expanded_topics.contains(topic));
        }
        assert!(parsed.expanded_topics.len() >= parsed.interpreted.topics.len());
        assert!(parsed.expanded_topics.contains(&"oauth".to_string()));
    }

    #[test]
    fn priority_word_maps_to_score_window() {
        let parsed = parse("critical incidents today");
        assert_eq!(parsed.interpreted.priority_range, Some((0.8, 1.0)));
        assert_eq!(parsed.interpreted.time_last.as_deref(), Some("24h"));
    }

    #[test]
    fn parse_never_panics_on_malformed_modifiers() {
        let parsed = parse("+sort:backwards +priority:urgent +format:pdf");
        assert_eq!(parsed.validation_errors.len(), 3);
    }

    #[test]
    fn parse_format_parse_is_idempotent() {
        for query in [
            "standup for alice",
            "database issues +sort:score +limit:20",
            "@bob and alice's work on login",
            "critical incidents today",
            "+topic:auth",
        ] {
            let once = parse(query);
            let twice = parse(&format(&once));
            assert_eq!(once.interpreted, twice.interpreted, "query: {query}");
            assert_eq!(once.expanded_topics, twice.expanded_topics, "query: {query}");
        }
    }
}
