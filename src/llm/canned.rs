//! Offline text generator with fixed responses.

use super::TextGenerator;
use crate::Result;
use async_trait::async_trait;

const RISK_RESPONSE: &str = "Based on current environmental conditions, your health risk is moderate. The elevated temperature and air quality index suggest taking precautions such as limiting outdoor activities during peak hours and staying hydrated. If you experience any respiratory symptoms or heat-related discomfort, please consult a healthcare provider.";

const EXERCISE_RESPONSE: &str = "Given current conditions, light indoor exercise is recommended over outdoor jogging. If you do go outside, early morning (before 8 AM) is safest when air quality is better and temperatures are cooler. Stay hydrated and watch for any signs of discomfort.";

const GENERAL_RESPONSE: &str = "Based on your query and current climate conditions in your area, I recommend following general health safety guidelines: stay hydrated, avoid peak sun hours (11 AM - 4 PM), monitor air quality alerts, and consult a healthcare provider if you experience any concerning symptoms. Your wellbeing is important!";

/// Keyword-matched responses used when no hosted provider is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedGenerator;

impl CannedGenerator {
    /// Creates a canned generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Picks the response for a prompt. Matching is case-sensitive except
    /// for the leading capital in "Risk".
    #[must_use]
    pub fn respond(prompt: &str) -> &'static str {
        if prompt.contains("risk") || prompt.contains("Risk") {
            RISK_RESPONSE
        } else if prompt.contains("jog") || prompt.contains("exercise") {
            EXERCISE_RESPONSE
        } else {
            GENERAL_RESPONSE
        }
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Using canned text generation");
        Ok(Self::respond(prompt).to_string())
    }

    async fn complete_with_system(&self, _system: &str, user: &str) -> Result<String> {
        self.complete(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("What is my Risk today?" => RISK_RESPONSE ; "capital risk")]
    #[test_case("overall risk score" => RISK_RESPONSE ; "lower risk")]
    #[test_case("Can I go for a jog?" => EXERCISE_RESPONSE ; "jog")]
    #[test_case("best exercise time" => EXERCISE_RESPONSE ; "exercise")]
    #[test_case("risky jog" => RISK_RESPONSE ; "risk wins over jog")]
    #[test_case("RISK" => GENERAL_RESPONSE ; "upper case does not match")]
    #[test_case("hello" => GENERAL_RESPONSE ; "default")]
    fn test_keyword_matching(prompt: &str) -> &'static str {
        CannedGenerator::respond(prompt)
    }

    #[tokio::test]
    async fn test_system_prompt_is_ignored_for_matching() {
        let out = CannedGenerator::new()
            .complete_with_system("risk analyst", "hello")
            .await
            .expect("canned never fails");
        assert_eq!(out, GENERAL_RESPONSE);
    }
}
