//! Prompt assembly for the government procedure assistant.

use crate::history::ConversationTurn;

/// System instruction for the assistant persona ("जुनु"), in Nepali.
/// Answers must be grounded in the retrieved document data only.
const PROMPT_TEMPLATE: &str = "तपाईं जुनु हुनुहुन्छ, सरकारी कार्यालयका प्रक्रियाहरू बुझ्न र कार्यहरू पूरा गर्न सहयोग पुर्‍याउन नेपाली नागरिकलाई सहयोग गर्ने ज्ञानयुक्त सहायक। प्रयोगकर्ताको प्रश्न र अघिल्लो कुराकानी इतिहासबाट सम्बन्धित विवरणहरू प्रयोग गरी सटीक, संक्षिप्त, र सहायक उत्तर दिनुहोस्। स्पष्टताका लागि अघिल्लो कुराकानीलाई स्पष्ट रूपमा उल्लेख गर्न आवश्यक नभएसम्म उल्लेख नगर्नुहोस्। डेटाबेसमा भएका तथ्यहरूका आधारमा मात्र उत्तर दिनुहोस्।\n\n---\n\n**कुराकानीको इतिहास:**\n{conversation_history}\n\n**हालको प्रयोगकर्ताको प्रश्न:**\n{user_question}\n\n**प्राप्त दस्तावेज डेटा:**\n{context}\n\n---\n";

/// Format conversation turns the way the model sees them.
fn format_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("प्रयोगकर्ता: {}\nसहायक: {}", turn.user, turn.assistant))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble the full prompt from recent turns, the current question, and
/// the retrieved context block. Callers pass turns already trimmed to the
/// configured history limit.
pub fn build_prompt(turns: &[ConversationTurn], user_question: &str, context: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{conversation_history}", &format_history(turns))
        .replace("{user_question}", user_question)
        .replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(user: &str, assistant: &str) -> ConversationTurn {
        ConversationTurn {
            user: user.to_string(),
            assistant: assistant.to_string(),
        }
    }

    #[test]
    fn prompt_contains_question_history_and_context() {
        let turns = vec![turn("पहिलो प्रश्न", "पहिलो उत्तर")];

        let prompt = build_prompt(&turns, "नागरिकता कसरी बनाउने?", "सन्दर्भ पाठ");

        assert!(prompt.contains("प्रयोगकर्ता: पहिलो प्रश्न"));
        assert!(prompt.contains("सहायक: पहिलो उत्तर"));
        assert!(prompt.contains("नागरिकता कसरी बनाउने?"));
        assert!(prompt.contains("सन्दर्भ पाठ"));
        // No template placeholders left behind.
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn empty_history_leaves_history_section_blank() {
        let prompt = build_prompt(&[], "प्रश्न", "सन्दर्भ");

        assert!(prompt.contains("**कुराकानीको इतिहास:**\n\n"));
    }

    #[test]
    fn multiple_turns_are_newline_separated() {
        let turns = vec![turn("q1", "a1"), turn("q2", "a2")];

        let history = format_history(&turns);

        assert_eq!(history, "प्रयोगकर्ता: q1\nसहायक: a1\nप्रयोगकर्ता: q2\nसहायक: a2");
    }
}
