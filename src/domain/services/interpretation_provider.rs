use std::sync::Arc;
use std::time::Duration;
use rand::Rng;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, warn, instrument};
use crate::domain::models::deck::DrawnCard;
use crate::domain::ports::LlmService;

const SYSTEM_INSTRUCTION: &str = "You are an experienced tarot reader with deep knowledge of the cards. \
Write a short but rich and mysterious interpretation of the spread.";

/// One card as the provider sees it: the meaning is already the one for the drawn orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReading {
    pub name: String,
    pub meaning: String,
    pub is_reversed: bool,
}

impl From<&DrawnCard> for CardReading {
    fn from(drawn: &DrawnCard) -> Self {
        Self {
            name: drawn.card.name.clone(),
            meaning: drawn.effective_meaning().to_string(),
            is_reversed: drawn.is_reversed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct GeneratedText {
    pub text: String,
    pub source: TextSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub available: bool,
    pub initialized: bool,
    pub credentials_configured: bool,
    pub connection_ok: bool,
}

pub struct InterpretationProvider {
    backend: Option<Arc<dyn LlmService>>,
    credentials_configured: bool,
    timeout: Duration,
}

impl InterpretationProvider {
    pub fn new(backend: Option<Arc<dyn LlmService>>, credentials_configured: bool, timeout: Duration) -> Self {
        Self { backend, credentials_configured, timeout }
    }

    /// Always returns text. Any backend problem (missing, uninitialized, failed, timed out,
    /// empty reply) is absorbed into one of the fallback interpretations.
    #[instrument(skip(self, cards, user_context), fields(cards = cards.len()))]
    pub async fn generate(&self, spread_name: &str, cards: &[CardReading], user_context: Option<&str>) -> GeneratedText {
        let Some(backend) = self.backend.as_ref().filter(|b| b.is_initialized()) else {
            warn!("Text backend unavailable, using fallback interpretation");
            return fallback(spread_name, cards);
        };

        let prompt = build_prompt(spread_name, cards, user_context);

        match timeout(self.timeout, backend.generate(&prompt, SYSTEM_INSTRUCTION)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                info!("Interpretation generated by the text backend");
                GeneratedText { text: text.trim().to_string(), source: TextSource::Generated }
            }
            Ok(Ok(_)) => {
                warn!("Text backend returned an empty reply, using fallback");
                fallback(spread_name, cards)
            }
            Ok(Err(e)) => {
                warn!("Text backend failed: {}. Using fallback", e);
                fallback(spread_name, cards)
            }
            Err(_) => {
                warn!("Text backend timed out after {:?}, using fallback", self.timeout);
                fallback(spread_name, cards)
            }
        }
    }

    pub async fn status(&self) -> ProviderStatus {
        let initialized = self.backend.as_ref().is_some_and(|b| b.is_initialized());
        let connection_ok = match &self.backend {
            Some(backend) if initialized => {
                timeout(self.timeout, backend.check_connection()).await.unwrap_or(false)
            }
            _ => false,
        };

        ProviderStatus {
            available: self.backend.is_some(),
            initialized,
            credentials_configured: self.credentials_configured,
            connection_ok,
        }
    }
}

pub fn build_prompt(spread_name: &str, cards: &[CardReading], user_context: Option<&str>) -> String {
    let cards_text = cards
        .iter()
        .map(|c| {
            let orientation = if c.is_reversed { " (reversed)" } else { "" };
            format!("• {}{} - {}", c.name, orientation, c.meaning)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let context = match user_context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(ctx) => format!("\nCONTEXT FROM THE SEEKER: {}\n", ctx),
        None => String::new(),
    };

    format!(
        "SPREAD: {}\n\nCARDS DRAWN:\n{}\n{}\n\
        Write an interpretation that covers:\n\
        1. The overall meaning of the spread (add 1-2 encouraging sentences)\n\
        2. Each card read in the context of the spread\n\
        3. Practical advice\n\n\
        Keep it concise and a little mysterious. Decorate the text with emoji.",
        spread_name, cards_text, context
    )
}

fn fallback(spread_name: &str, cards: &[CardReading]) -> GeneratedText {
    let names = cards.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ");
    let texts = fallback_texts(spread_name, &names);
    let idx = rand::thread_rng().gen_range(0..texts.len());
    GeneratedText { text: texts[idx].clone(), source: TextSource::Fallback }
}

fn fallback_texts(spread_name: &str, names: &str) -> [String; 3] {
    [
        format!(
            "🔮 Your reading for the \"{spread_name}\" spread\n\n\
            Cards drawn: {names}\n\n\
            The cards show a period of change and new opportunities in your life. \
            Stay open to new ideas and trust your intuition. \
            Interesting events and important decisions lie ahead.\n\n\
            Advice: listen to your heart and do not fear change. The time to act has come! 🌟"
        ),
        format!(
            "✨ A magical reading: \"{spread_name}\"\n\n\
            Cards: {names}\n\n\
            Your cards reveal the secrets of the future and point the way to success. \
            The universe favours you in this period. \
            Trust the wisdom of the cards and follow the signs of fate.\n\n\
            Recommendation: watch for the signs and chances that appear on your path. 🌙"
        ),
        format!(
            "🌟 Interpretation of the \"{spread_name}\" spread\n\n\
            Cards that fell: {names}\n\n\
            The tarot says you stand on the threshold of important changes. \
            Your intuition is especially strong right now, so listen to it. \
            New opportunities and interesting meetings are waiting for you.\n\n\
            Guidance: believe in yourself. The universe supports your aspirations! ✨"
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::error::AppError;

    struct EchoBackend;

    #[async_trait]
    impl LlmService for EchoBackend {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, AppError> {
            Ok(format!("  generated for: {}  ", prompt.lines().next().unwrap_or_default()))
        }
        fn is_initialized(&self) -> bool { true }
        async fn check_connection(&self) -> bool { true }
    }

    struct BrokenBackend;

    #[async_trait]
    impl LlmService for BrokenBackend {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, AppError> {
            Err(AppError::ProviderUnavailable("connection refused".into()))
        }
        fn is_initialized(&self) -> bool { true }
        async fn check_connection(&self) -> bool { false }
    }

    struct SlowBackend;

    #[async_trait]
    impl LlmService for SlowBackend {
        async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, AppError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".into())
        }
        fn is_initialized(&self) -> bool { true }
        async fn check_connection(&self) -> bool { true }
    }

    fn cards() -> Vec<CardReading> {
        vec![
            CardReading { name: "The Fool".into(), meaning: "New beginnings".into(), is_reversed: false },
            CardReading { name: "The Tower".into(), meaning: "Avoided disaster".into(), is_reversed: true },
        ]
    }

    fn provider(backend: Option<Arc<dyn LlmService>>) -> InterpretationProvider {
        InterpretationProvider::new(backend, true, Duration::from_millis(200))
    }

    fn assert_fallback(result: &GeneratedText) {
        assert_eq!(result.source, TextSource::Fallback);
        assert!(result.text.contains("Past, Present, Future"));
        assert!(result.text.contains("The Fool"));
        assert!(result.text.contains("The Tower"));
    }

    #[test]
    fn test_prompt_uses_drawn_meaning_and_context() {
        let prompt = build_prompt("Celtic Cross", &cards(), Some("  career  "));
        assert!(prompt.contains("SPREAD: Celtic Cross"));
        assert!(prompt.contains("• The Fool - New beginnings"));
        assert!(prompt.contains("• The Tower (reversed) - Avoided disaster"));
        assert!(prompt.contains("CONTEXT FROM THE SEEKER: career"));

        let without = build_prompt("Celtic Cross", &cards(), Some("   "));
        assert!(!without.contains("CONTEXT FROM THE SEEKER"));
    }

    #[tokio::test]
    async fn test_generated_text_is_trimmed() {
        let result = provider(Some(Arc::new(EchoBackend))).generate("Past, Present, Future", &cards(), None).await;
        assert_eq!(result.source, TextSource::Generated);
        assert_eq!(result.text, "generated for: SPREAD: Past, Present, Future");
    }

    #[tokio::test]
    async fn test_missing_backend_falls_back() {
        let result = provider(None).generate("Past, Present, Future", &cards(), None).await;
        assert_fallback(&result);
    }

    #[tokio::test]
    async fn test_backend_error_falls_back() {
        let result = provider(Some(Arc::new(BrokenBackend))).generate("Past, Present, Future", &cards(), None).await;
        assert_fallback(&result);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let result = provider(Some(Arc::new(SlowBackend))).generate("Past, Present, Future", &cards(), None).await;
        assert_fallback(&result);
    }

    #[tokio::test]
    async fn test_status_reports_each_flag() {
        let status = provider(None).status().await;
        assert!(!status.available && !status.initialized && !status.connection_ok);
        assert!(status.credentials_configured);

        let status = provider(Some(Arc::new(BrokenBackend))).status().await;
        assert!(status.available && status.initialized);
        assert!(!status.connection_ok);

        let status = provider(Some(Arc::new(EchoBackend))).status().await;
        assert!(status.connection_ok);
    }
}
