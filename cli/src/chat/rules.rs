//! # Scripted Rule Classifier
//!
//! File: cli/src/chat/rules.rs
//!
//! ## Overview
//!
//! The default `Classifier`: a table of rules, each pairing case-insensitive
//! regular expressions with an intent label, a confidence, and a response
//! template. No language model is involved.
//!
//! Classification picks the matching rule with the highest confidence; on a
//! tie the earlier rule wins. Configured rules are placed before the built-in
//! table, so they win ties against it. Text that matches nothing gets a
//! generic `general_inquiry` reply.
//!
//! The persona reported with a reply is the rule's own persona, else the
//! visitor's role, else the configured default.
//!
use crate::chat::classifier::{Classifier, ClassifierReply, UserProfile};
use crate::chat::welcome::greeting_name;
use crate::core::config::{self, AssistantConfig, ClassifierConfig, RuleConfig};
use crate::core::error::{ChatError, Result};
use crate::core::templating;
use anyhow::anyhow;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

pub const UNKNOWN_INTENT: &str = "general_inquiry";
const UNKNOWN_CONFIDENCE: f64 = 0.3;
const UNKNOWN_RESPONSE: &str = "I'm not quite sure I understood that, {{ first_name }}. \
You can ask me about **courses**, **enrollment**, **fees**, **Gurukuls**, or **certificates**, \
or reach our team through the [contact page](/contact).";

struct BuiltinRule {
    intent: &'static str,
    patterns: &'static [&'static str],
    response: &'static str,
    confidence: f64,
    with_fact: bool,
}

const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        intent: "greeting",
        patterns: &[r"^\s*(hi|hello|hey|namaste|hari om)\b", r"^\s*good (morning|afternoon|evening)\b"],
        response: "🙏 Namaste {{ first_name }}! What would you like to explore today?",
        confidence: 0.95,
        with_fact: false,
    },
    BuiltinRule {
        intent: "course_inquiry",
        patterns: &[r"\bcourses?\b", r"\bmy age\b", r"\bage group", r"\bclass(es)?\b"],
        response: "We offer courses for every age group:\n\
**Elementary** (ages 4-7), **Basic** (8-11), **Intermediate** (12-15) and **Advanced** (16-19).\n\
Browse the full catalogue on the [courses page](/courses).",
        confidence: 0.9,
        with_fact: false,
    },
    BuiltinRule {
        intent: "enrollment",
        patterns: &[r"\benrol", r"\bregist(er|ration)\b", r"\bsign ?up\b", r"\bjoin\b"],
        response: "Enrolling is simple:\n1. [Create an account](/auth/signup)\n\
2. Pick a course from the [catalogue](/courses)\n3. Submit the enrollment request.\n\
A teacher approves it and you will find the course on your **dashboard**.",
        confidence: 0.92,
        with_fact: false,
    },
    BuiltinRule {
        intent: "fee_inquiry",
        patterns: &[r"\bfees?\b", r"\bcost", r"\bprice", r"\bpay(ment)?\b", r"how much"],
        response: "Course fees are listed on each course page and depend on the level and duration. \
Many introductory courses are **free**. See the [courses page](/courses) for details.",
        confidence: 0.9,
        with_fact: false,
    },
    BuiltinRule {
        intent: "gurukul_info",
        patterns: &[r"\bgurukuls?\b", r"\bhinduism\b", r"\bmantra", r"\bphilosophy\b", r"\byoga\b"],
        response: "{{ brand }} runs five Gurukuls: **Hinduism**, **Mantra**, **Philosophy**, \
**Sanskrit** and **Yoga & Wellness**.\nEach has its own courses and teachers. \
Visit the [Gurukuls page](/gurukuls) to learn more.",
        confidence: 0.85,
        with_fact: true,
    },
    BuiltinRule {
        intent: "certificate_inquiry",
        patterns: &[r"\bcertificat"],
        response: "Certificates are issued when you complete a course. \
Your teacher marks the course complete and the certificate appears on your **dashboard**, ready to download.",
        confidence: 0.9,
        with_fact: false,
    },
    BuiltinRule {
        intent: "fun_fact",
        patterns: &[r"\bfacts?\b", r"\binteresting\b", r"did you know"],
        response: "Here is something interesting for you, {{ first_name }}!",
        confidence: 0.85,
        with_fact: true,
    },
    BuiltinRule {
        intent: "sanskrit_wisdom",
        patterns: &[r"\bsanskrit\b", r"\bwisdom\b", r"\bshloka", r"\bquote"],
        response: "**वसुधैव कुटुम्बकम्** (Vasudhaiva Kutumbakam)\n\
\"The whole world is one family.\" From the Maha Upanishad.",
        confidence: 0.88,
        with_fact: false,
    },
];

const BUILTIN_FACTS: &[&str] = &[
    "The word \"Yoga\" comes from the Sanskrit root \"yuj\", meaning to unite.",
    "Sanskrit is one of the oldest documented languages, with texts over 3,500 years old.",
    "The Rigveda contains 1,028 hymns organised into ten books called mandalas.",
    "The Gurukul system placed students in the teacher's home to learn through daily life.",
    "\"Namaste\" means \"the divine in me bows to the divine in you\".",
    "The number zero as a written digit was developed by mathematicians in ancient India.",
];

struct Rule {
    intent: String,
    persona: Option<String>,
    patterns: Vec<Regex>,
    response: String,
    confidence: f64,
    with_fact: bool,
}

impl Rule {
    fn compile(config: &RuleConfig) -> Result<Self> {
        config::validate_rule(config)?;
        let patterns = config
            .patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p).case_insensitive(true).build().map_err(|e| {
                    anyhow!(ChatError::InvalidRule {
                        intent: config.intent.clone(),
                        reason: e.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            intent: config.intent.clone(),
            persona: config.persona.clone(),
            patterns,
            response: config.response.clone(),
            confidence: config.confidence,
            with_fact: config.with_fact,
        })
    }

    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

fn builtin_rule_configs() -> impl Iterator<Item = RuleConfig> {
    BUILTIN_RULES.iter().map(|r| RuleConfig {
        intent: r.intent.to_string(),
        patterns: r.patterns.iter().map(|p| p.to_string()).collect(),
        response: r.response.to_string(),
        confidence: r.confidence,
        persona: None,
        with_fact: r.with_fact,
    })
}

pub struct ScriptedClassifier {
    rules: Vec<Rule>,
    facts: Vec<String>,
    next_fact: AtomicUsize,
    default_persona: String,
    assistant: String,
    brand: String,
}

impl ScriptedClassifier {
    pub fn new(classifier: &ClassifierConfig, assistant: &AssistantConfig) -> Result<Self> {
        let rules = classifier
            .rules
            .iter()
            .cloned()
            .chain(builtin_rule_configs())
            .map(|r| Rule::compile(&r))
            .collect::<Result<Vec<_>>>()?;
        let facts = classifier
            .facts
            .iter()
            .cloned()
            .chain(BUILTIN_FACTS.iter().map(|f| f.to_string()))
            .collect();
        debug!(
            "Scripted classifier ready with {} rules ({} configured)",
            rules.len(),
            classifier.rules.len()
        );
        Ok(Self {
            rules,
            facts,
            next_fact: AtomicUsize::new(0),
            default_persona: classifier.default_persona.clone(),
            assistant: assistant.name.clone(),
            brand: assistant.brand.clone(),
        })
    }

    /// Built-in rules and facts only.
    pub fn builtin() -> Result<Self> {
        Self::new(&ClassifierConfig::default(), &AssistantConfig::default())
    }

    fn best_rule(&self, text: &str) -> Option<&Rule> {
        let mut best: Option<&Rule> = None;
        for rule in self.rules.iter().filter(|r| r.matches(text)) {
            trace!("Rule '{}' matched ({})", rule.intent, rule.confidence);
            if best.map_or(true, |b| rule.confidence > b.confidence) {
                best = Some(rule);
            }
        }
        best
    }

    fn next_fact(&self) -> Option<String> {
        if self.facts.is_empty() {
            return None;
        }
        let index = self.next_fact.fetch_add(1, Ordering::Relaxed) % self.facts.len();
        Some(self.facts[index].clone())
    }

    fn persona_for(&self, rule: Option<&Rule>, user: Option<&UserProfile>) -> String {
        rule.and_then(|r| r.persona.clone())
            .or_else(|| {
                user.and_then(|u| u.role.as_deref())
                    .map(|role| role.trim().to_lowercase())
                    .filter(|role| !role.is_empty())
            })
            .unwrap_or_else(|| self.default_persona.clone())
    }

    fn render(&self, label: &str, template: &str, user: Option<&UserProfile>) -> Result<String> {
        let context = HashMap::from([
            ("first_name".to_string(), greeting_name(user)),
            ("assistant".to_string(), self.assistant.clone()),
            ("brand".to_string(), self.brand.clone()),
        ]);
        templating::render_str(label, template, &context)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, text: &str, user: Option<&UserProfile>) -> Result<ClassifierReply> {
        let rule = self.best_rule(text);
        let persona = self.persona_for(rule, user);
        let reply = match rule {
            Some(rule) => ClassifierReply {
                message: self.render(&rule.intent, &rule.response, user)?,
                persona: Some(persona),
                intent: Some(rule.intent.clone()),
                confidence: Some(rule.confidence),
                did_you_know: if rule.with_fact { self.next_fact() } else { None },
            },
            None => ClassifierReply {
                message: self.render(UNKNOWN_INTENT, UNKNOWN_RESPONSE, user)?,
                persona: Some(persona),
                intent: Some(UNKNOWN_INTENT.to_string()),
                confidence: Some(UNKNOWN_CONFIDENCE),
                did_you_know: None,
            },
        };
        debug!(
            intent = reply.intent.as_deref().unwrap_or_default(),
            confidence = reply.confidence.unwrap_or_default(),
            "Classified message"
        );
        Ok(reply)
    }
}
