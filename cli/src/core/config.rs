//! # Gurukul Chat Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads, merges, and validates the configuration for the chat
//! assistant. Every setting has a built-in default reproducing the stock
//! eYogi assistant, so running without any configuration file is normal.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit file passed with `--config`
//! 2. Project-specific `.gurukul-chat.toml` in the current directory or ancestors
//! 3. User-specific `config.toml` in the platform config directory
//! 4. Default values defined in the code
//!
//! An explicit file replaces the file-based sources entirely. Otherwise the
//! project file is merged over the user file field by field: a project value
//! wins when it differs from the built-in default.
//!
//! ## Examples
//!
//! ```toml
//! [assistant]
//! name = "eYogi AI Assistant"
//!
//! [pacing]
//! min_delay_ms = 0
//! max_delay_ms = 0
//!
//! [voice]
//! transcripts = "~/voice-demo.txt"
//!
//! [[classifier.rules]]
//! intent = "holidays"
//! patterns = ["holiday", "vacation"]
//! response = "Gurukul sessions pause for Diwali week."
//! confidence = 0.8
//! ```
//!
use crate::core::error::{ChatError, Result};
use crate::core::templating;
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Presentation of the assistant: names, greetings, fallback text.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_brand")]
    pub brand: String,
    /// Tera template for the greeting shown when a conversation opens.
    #[serde(default = "default_welcome_template")]
    pub welcome_template: String,
    /// Tera template for the greeting shown after the log is cleared.
    #[serde(default = "default_cleared_template")]
    pub cleared_template: String,
    /// Reply appended whenever the classifier fails.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    #[serde(default = "default_quick_questions")]
    pub quick_questions: Vec<String>,
}

/// Simulated typing delay applied before an assistant reply becomes visible.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Voice capture settings.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_language")]
    pub language: String,
    /// File of canned transcripts (one per line) used as the speech source
    /// in environments without a microphone. Can use ~. Will be expanded.
    #[serde(default)]
    pub transcripts: Option<String>,
}

/// Extra rules and facts for the scripted classifier.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Persona reported when the visitor has no role.
    #[serde(default = "default_persona")]
    pub default_persona: String,
    /// Rules evaluated before the built-in ones.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    /// Additional "did you know" facts.
    #[serde(default)]
    pub facts: Vec<String>,
}

/// A single scripted classifier rule.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub intent: String,
    /// Case-insensitive regular expressions; any match selects the rule.
    pub patterns: Vec<String>,
    /// Tera template for the reply text.
    pub response: String,
    #[serde(default = "default_rule_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub persona: Option<String>,
    /// Attach a "did you know" fact to the reply.
    #[serde(default)]
    pub with_fact: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            brand: default_brand(),
            welcome_template: default_welcome_template(),
            cleared_template: default_cleared_template(),
            fallback_message: default_fallback_message(),
            quick_questions: default_quick_questions(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_language(),
            transcripts: None,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_persona: default_persona(),
            rules: Vec::new(),
            facts: Vec::new(),
        }
    }
}

fn default_assistant_name() -> String {
    "eYogi AI Assistant".to_string()
}
fn default_brand() -> String {
    "eYogi Gurukul".to_string()
}
fn default_welcome_template() -> String {
    "🙏 Namaste {{ first_name }}! I'm your {{ assistant }}. I'm here to help you with questions \
     about our courses, Gurukuls, enrollment, and anything related to your learning journey. \
     How can I assist you today?"
        .to_string()
}
fn default_cleared_template() -> String {
    "🙏 Chat cleared! I'm ready to help you with any questions about {{ brand }}. \
     What would you like to know?"
        .to_string()
}
fn default_fallback_message() -> String {
    "I apologize, but I encountered an error processing your message. Please try again or \
     contact our support team for assistance."
        .to_string()
}
fn default_quick_questions() -> Vec<String> {
    [
        "What courses are available for my age?",
        "How do I enroll in a course?",
        "What is the fee structure?",
        "Tell me about Hinduism Gurukul",
        "How do I get certificates?",
        "What are the different Gurukuls?",
        "Tell me an interesting fact",
        "Share some Sanskrit wisdom",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}
fn default_min_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    2000
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_persona() -> String {
    "student".to_string()
}
fn default_rule_confidence() -> f64 {
    0.8
}

const PROJECT_CONFIG_FILENAME: &str = ".gurukul-chat.toml";

/// Loads the effective configuration.
///
/// With `explicit` set, only that file (plus defaults) is used.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)
        }
    };
    expand_config_paths(&mut config).context("Failed to expand paths in configuration")?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "eYogi", "gurukul-chat") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file ({}) found.", PROJECT_CONFIG_FILENAME);
        Ok(None)
    }
}

/// Walks from `start` towards the root looking for the project config file,
/// stopping at the first directory that contains `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

fn pick<T: PartialEq>(project: T, user: T, default: T) -> T {
    if project != default {
        project
    } else {
        user
    }
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let defaults = Config::default();

    let assistant = AssistantConfig {
        name: pick(project.assistant.name, user.assistant.name, defaults.assistant.name),
        brand: pick(project.assistant.brand, user.assistant.brand, defaults.assistant.brand),
        welcome_template: pick(
            project.assistant.welcome_template,
            user.assistant.welcome_template,
            defaults.assistant.welcome_template,
        ),
        cleared_template: pick(
            project.assistant.cleared_template,
            user.assistant.cleared_template,
            defaults.assistant.cleared_template,
        ),
        fallback_message: pick(
            project.assistant.fallback_message,
            user.assistant.fallback_message,
            defaults.assistant.fallback_message,
        ),
        quick_questions: pick(
            project.assistant.quick_questions,
            user.assistant.quick_questions,
            defaults.assistant.quick_questions,
        ),
    };
    let pacing = pick(project.pacing, user.pacing, defaults.pacing);
    let voice = VoiceConfig {
        enabled: pick(project.voice.enabled, user.voice.enabled, defaults.voice.enabled),
        language: pick(project.voice.language, user.voice.language, defaults.voice.language),
        transcripts: project.voice.transcripts.or(user.voice.transcripts),
    };
    // Rules and facts accumulate: project entries take priority, user entries follow.
    let mut rules = project.classifier.rules;
    rules.extend(user.classifier.rules);
    let mut facts = project.classifier.facts;
    facts.extend(user.classifier.facts);
    let classifier = ClassifierConfig {
        default_persona: pick(
            project.classifier.default_persona,
            user.classifier.default_persona,
            defaults.classifier.default_persona,
        ),
        rules,
        facts,
    };

    Config {
        assistant,
        pacing,
        voice,
        classifier,
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(transcripts) = config.voice.transcripts.as_mut() {
        *transcripts = shellexpand::tilde(transcripts.as_str()).into_owned();
        debug!("Expanded voice transcripts path: {}", transcripts);
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    if config.pacing.min_delay_ms > config.pacing.max_delay_ms {
        return Err(anyhow!(ChatError::Config(format!(
            "pacing.min_delay_ms ({}) exceeds pacing.max_delay_ms ({}).",
            config.pacing.min_delay_ms, config.pacing.max_delay_ms
        ))));
    }
    if config.assistant.fallback_message.trim().is_empty() {
        return Err(anyhow!(ChatError::Config(
            "assistant.fallback_message cannot be empty.".to_string()
        )));
    }

    let probe: HashMap<String, String> = [
        ("first_name", "friend"),
        ("assistant", config.assistant.name.as_str()),
        ("brand", config.assistant.brand.as_str()),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    templating::render_str("assistant.welcome_template", &config.assistant.welcome_template, &probe)?;
    templating::render_str("assistant.cleared_template", &config.assistant.cleared_template, &probe)?;

    for rule in &config.classifier.rules {
        validate_rule(rule)?;
        templating::render_str(&rule.intent, &rule.response, &probe)?;
    }

    if let Some(path) = &config.voice.transcripts {
        if !Path::new(path).is_file() {
            warn!("Configured voice transcripts file '{}' does not exist.", path);
        }
    }
    info!("Configuration validation successful.");
    Ok(())
}

/// Checks a rule's shape: non-empty intent and patterns, compilable
/// patterns, confidence within [0, 1].
pub fn validate_rule(rule: &RuleConfig) -> Result<()> {
    let invalid = |reason: String| {
        anyhow!(ChatError::InvalidRule {
            intent: rule.intent.clone(),
            reason,
        })
    };
    if rule.intent.trim().is_empty() {
        return Err(invalid("intent cannot be empty".to_string()));
    }
    if rule.patterns.is_empty() {
        return Err(invalid("at least one pattern is required".to_string()));
    }
    if !(0.0..=1.0).contains(&rule.confidence) {
        return Err(invalid(format!(
            "confidence {} is outside [0, 1]",
            rule.confidence
        )));
    }
    for pattern in &rule.patterns {
        Regex::new(pattern).map_err(|e| invalid(format!("pattern '{}': {}", pattern, e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rule(intent: &str, patterns: &[&str], confidence: f64) -> RuleConfig {
        RuleConfig {
            intent: intent.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            response: "ok".to_string(),
            confidence,
            persona: None,
            with_fact: false,
        }
    }

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [assistant]
            name = "Guru Bot"

            [pacing]
            min_delay_ms = 0
            max_delay_ms = 10

            [voice]
            transcripts = "~/voice.txt"

            [[classifier.rules]]
            intent = "holidays"
            patterns = ["holiday", "vacation"]
            response = "We pause for Diwali."
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.assistant.name, "Guru Bot");
        assert_eq!(config.assistant.brand, default_brand()); // Default
        assert_eq!(config.assistant.quick_questions.len(), 8);
        assert_eq!(config.pacing.max_delay_ms, 10);
        assert!(config.voice.enabled);
        assert_eq!(config.voice.language, "en-US");
        assert_eq!(config.voice.transcripts.as_deref(), Some("~/voice.txt")); // Not yet expanded
        assert_eq!(config.classifier.rules.len(), 1);
        assert_eq!(config.classifier.rules[0].confidence, 0.8);
        assert_eq!(config.classifier.default_persona, "student");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[pacing]\nspeed = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            voice: VoiceConfig {
                transcripts: Some("~/voice.txt".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        expand_config_paths(&mut config).unwrap();

        let home_dir = dirs::home_dir().unwrap();
        assert_eq!(
            config.voice.transcripts.unwrap(),
            home_dir.join("voice.txt").to_string_lossy()
        );
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let user = Config {
            assistant: AssistantConfig {
                name: "User Bot".into(),
                brand: "User Brand".into(),
                ..Default::default()
            },
            classifier: ClassifierConfig {
                rules: vec![rule("user_rule", &["u"], 0.5)],
                ..Default::default()
            },
            ..Default::default()
        };
        let project = Config {
            assistant: AssistantConfig {
                name: "Project Bot".into(),
                ..Default::default()
            },
            classifier: ClassifierConfig {
                rules: vec![rule("project_rule", &["p"], 0.5)],
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = merge_configs(user, Some(project));
        assert_eq!(merged.assistant.name, "Project Bot");
        assert_eq!(merged.assistant.brand, "User Brand"); // Project left default
        let intents: Vec<_> = merged.classifier.rules.iter().map(|r| r.intent.as_str()).collect();
        assert_eq!(intents, vec!["project_rule", "user_rule"]);
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_pacing_range() {
        let config = Config {
            pacing: PacingConfig {
                min_delay_ms: 500,
                max_delay_ms: 100,
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("exceeds pacing.max_delay_ms"));
    }

    #[test]
    fn test_validate_rule_rejects_bad_confidence_and_pattern() {
        assert!(validate_rule(&rule("fees", &["fee"], 0.9)).is_ok());

        let err = validate_rule(&rule("fees", &["fee"], 1.5)).unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));

        let err = validate_rule(&rule("fees", &["(unclosed"], 0.5)).unwrap_err();
        assert!(err.to_string().contains("pattern '(unclosed'"));

        let err = validate_rule(&rule("fees", &[], 0.5)).unwrap_err();
        assert!(err.to_string().contains("at least one pattern"));
    }

    #[test]
    fn test_validate_broken_welcome_template() {
        let config = Config {
            assistant: AssistantConfig {
                welcome_template: "Hello {{ first_name".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_find_project_config_stops_at_git() {
        let temp_dir = tempdir().unwrap();
        let repo = temp_dir.path().join("repo");
        let nested = repo.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(repo.join(".git")).unwrap();
        // Above the repo root: must not be found.
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(find_project_config_path(&nested), None);

        fs::write(repo.join("a").join(PROJECT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(
            find_project_config_path(&nested),
            Some(repo.join("a").join(PROJECT_CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_load_config_explicit_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("chat.toml");
        fs::write(&path, "[pacing]\nmin_delay_ms = 0\nmax_delay_ms = 0\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.pacing.max_delay_ms, 0);
        assert_eq!(config.assistant.name, default_assistant_name());
    }
}
