//! Travel-specific prompts over [`AiClient::complete`].

use crate::client::{AiClient, ChatMessage};
use crate::error::AiError;
use crate::prompts;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const SERVICE_NAME: &str = "Alibaba Cloud Bailian LLM";
const SUMMARY_FALLBACK_CHARS: usize = 200;

/// What the user asked the planner for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRequest {
    pub destination: String,
    pub days: i64,
    pub budget: f64,
    pub travelers: i64,
    #[serde(default)]
    pub preferences: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Spending figures handed to the budget analyst.
#[derive(Debug, Clone, Default)]
pub struct BudgetSnapshot {
    pub total_budget: f64,
    pub total_spent: f64,
    pub by_category: BTreeMap<String, f64>,
    pub remaining_days: i64,
}

/// A JSON document produced by the model.
///
/// `raw_content` is set only when the model's reply was not JSON and
/// `document` is a synthesized fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct AiDocument {
    pub document: Value,
    pub raw_content: Option<String>,
    pub usage: Value,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceStatus {
    pub available: bool,
    pub service: &'static str,
    pub model: String,
    pub error: Option<String>,
}

/// Pulls a JSON object out of a model reply.
///
/// Accepts a bare object, an object inside a fenced code block, or an
/// object surrounded by prose.
pub fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    let parse = |s: &str| serde_json::from_str::<Value>(s.trim()).ok().filter(Value::is_object);

    if let Some(v) = parse(trimmed) {
        return Some(v);
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        // Skip the language tag line, if any.
        let body = after.split_once('\n').map_or(after, |(_, rest)| rest);
        if let Some(end) = body.find("```") {
            if let Some(v) = parse(&body[..end]) {
                return Some(v);
            }
        }
    }

    let open = trimmed.find('{')?;
    let close = trimmed.rfind('}')?;
    if close > open {
        parse(&trimmed[open..=close])
    } else {
        None
    }
}

fn summary_excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(SUMMARY_FALLBACK_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

fn into_document(content: String, usage: Value, fallback: impl FnOnce(&str) -> Value) -> AiDocument {
    match extract_json(&content) {
        Some(document) => AiDocument {
            document,
            raw_content: None,
            usage,
        },
        None => {
            tracing::warn!(chars = content.chars().count(), "LLM reply was not JSON, using fallback");
            AiDocument {
                document: fallback(&content),
                raw_content: Some(content),
                usage,
            }
        }
    }
}

impl AiClient {
    /// Drafts a full itinerary for `request`.
    pub async fn generate_travel_plan(&self, request: &TravelRequest) -> Result<AiDocument, AiError> {
        let messages = [
            ChatMessage::system(prompts::TRAVEL_PLAN_SYSTEM),
            ChatMessage::user(prompts::travel_plan_user(
                &request.destination,
                request.days,
                request.budget,
                request.travelers,
                &request.preferences,
                request.start_date.as_deref(),
                request.end_date.as_deref(),
            )),
        ];
        let completion = self.complete(&messages, 0.7, 3000).await?;

        Ok(into_document(completion.content, completion.usage, |raw| {
            json!({
                "title": format!("{} {}-day trip", request.destination, request.days),
                "summary": summary_excerpt(raw),
                "dailyItinerary": [],
                "budgetBreakdown": {},
                "travelTips": [],
                "emergencyContacts": []
            })
        }))
    }

    /// Asks for an analysis of spending so far.
    pub async fn analyze_budget(&self, snapshot: &BudgetSnapshot) -> Result<AiDocument, AiError> {
        let by_category = serde_json::to_string_pretty(&snapshot.by_category)
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        let messages = [
            ChatMessage::system(prompts::BUDGET_ANALYSIS_SYSTEM),
            ChatMessage::user(prompts::budget_analysis_user(
                snapshot.total_budget,
                snapshot.total_spent,
                &by_category,
                snapshot.remaining_days,
            )),
        ];
        let completion = self.complete(&messages, 0.5, 1500).await?;

        Ok(into_document(completion.content, completion.usage, |raw| {
            let utilization = if snapshot.total_budget > 0.0 {
                snapshot.total_spent / snapshot.total_budget
            } else {
                0.0
            };
            json!({
                "analysis": raw,
                "currentStatus": {
                    "totalSpent": snapshot.total_spent,
                    "remainingBudget": snapshot.total_budget - snapshot.total_spent,
                    "budgetUtilization": utilization
                },
                "categoryAnalysis": [],
                "recommendations": [],
                "forecast": {}
            })
        }))
    }

    /// Destination overview plus answers to the user's questions.
    pub async fn travel_advice(
        &self,
        destination: &str,
        preferences: &[String],
        questions: &[String],
    ) -> Result<AiDocument, AiError> {
        let messages = [
            ChatMessage::system(prompts::TRAVEL_ADVICE_SYSTEM),
            ChatMessage::user(prompts::travel_advice_user(destination, preferences, questions)),
        ];
        let completion = self.complete(&messages, 0.7, 2000).await?;

        Ok(into_document(completion.content, completion.usage, |_| {
            let answers: Vec<Value> = questions
                .iter()
                .map(|q| json!({ "question": q, "answer": "" }))
                .collect();
            json!({
                "destinationInfo": {},
                "recommendations": {},
                "answers": answers,
                "travelTips": []
            })
        }))
    }

    /// Sends a tiny probe prompt. Never fails; problems are reported in
    /// the returned status.
    pub async fn check_status(&self) -> ServiceStatus {
        let messages = [
            ChatMessage::system(prompts::STATUS_SYSTEM),
            ChatMessage::user(prompts::STATUS_USER),
        ];
        let error = match self.complete(&messages, 0.1, 10).await {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        ServiceStatus {
            available: error.is_none(),
            service: SERVICE_NAME,
            model: self.config().model.clone(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_object() {
        assert_eq!(extract_json(r#" {"a": 1} "#), Some(json!({ "a": 1 })));
    }

    #[test]
    fn extracts_fenced_block() {
        let reply = "Here is your plan:\n```json\n{\"title\": \"Xi'an\"}\n```\nEnjoy!";
        assert_eq!(extract_json(reply), Some(json!({ "title": "Xi'an" })));
    }

    #[test]
    fn extracts_object_from_prose() {
        let reply = "Sure! {\"tips\": [\"carry cash\"]} Have fun.";
        assert_eq!(extract_json(reply), Some(json!({ "tips": ["carry cash"] })));
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(extract_json("[1, 2, 3]"), None);
        assert_eq!(extract_json("I could not plan that trip."), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn fallback_keeps_raw_text() {
        let doc = into_document("plain words".to_string(), json!({ "total_tokens": 3 }), |raw| {
            json!({ "analysis": raw })
        });
        assert_eq!(doc.document["analysis"], "plain words");
        assert_eq!(doc.raw_content.as_deref(), Some("plain words"));
        assert_eq!(doc.usage["total_tokens"], 3);
    }

    #[test]
    fn summary_excerpt_counts_characters() {
        let long = "游".repeat(300);
        let excerpt = summary_excerpt(&long);
        assert_eq!(excerpt.chars().count(), SUMMARY_FALLBACK_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn travel_request_accepts_camel_case() {
        let req: TravelRequest = serde_json::from_value(json!({
            "destination": "Chengdu",
            "days": 4,
            "budget": 6000,
            "travelers": 2,
            "startDate": "2024-05-01"
        }))
        .unwrap();
        assert_eq!(req.start_date.as_deref(), Some("2024-05-01"));
        assert!(req.preferences.is_empty());
    }
}
