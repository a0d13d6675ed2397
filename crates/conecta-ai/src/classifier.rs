//! Conversation complexity classifier.
//!
//! Pure, deterministic routing heuristic: the most recent user message is
//! matched against keyword sets and length thresholds to pick a
//! [`Complexity`] tier. No I/O, never fails; malformed input (no user
//! message at all) degrades to `Medium`.

use crate::{Complexity, Message, Role};

/// Simple-intent vocabulary: greetings, thanks, farewells, time-of-day.
const SIMPLE_KEYWORDS: &[&str] = &[
    "oi",
    "olá",
    "obrigado",
    "obrigada",
    "tchau",
    "status",
    "horário",
    "agradeço",
    "bom dia",
    "boa tarde",
    "boa noite",
];

/// Complex-intent vocabulary: failures, complaints, cancellation, legal and
/// billing disputes.
const COMPLEX_KEYWORDS: &[&str] = &[
    "problema",
    "não funciona",
    "erro",
    "reclamação",
    "cancelar",
    "contrato",
    "jurídico",
    "reembolso",
    "velocidade",
    "instabilidade",
    "suporte técnico",
];

/// Messages longer than this many characters are considered complex.
const LENGTH_THRESHOLD: usize = 150;

/// More than this many question marks marks the message complex.
const QUESTION_THRESHOLD: usize = 1;

/// Tunable classification rules. `Default` carries the production keyword
/// sets and thresholds above.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    pub simple_keywords: Vec<String>,
    pub complex_keywords: Vec<String>,
    pub length_threshold: usize,
    pub question_threshold: usize,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            simple_keywords: SIMPLE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            complex_keywords: COMPLEX_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            length_threshold: LENGTH_THRESHOLD,
            question_threshold: QUESTION_THRESHOLD,
        }
    }
}

impl ClassifierRules {
    /// Classify a conversation by its most recent user message.
    pub fn classify(&self, messages: &[Message]) -> Complexity {
        let last_user = match messages.iter().rev().find(|m| m.role == Role::User) {
            Some(m) => m.content.to_lowercase(),
            None => return Complexity::Medium,
        };

        if self.simple_keywords.iter().any(|k| last_user.contains(k.as_str())) {
            return Complexity::Simple;
        }

        if self.complex_keywords.iter().any(|k| last_user.contains(k.as_str())) {
            return Complexity::Complex;
        }

        let questions = last_user.matches('?').count();
        if last_user.chars().count() > self.length_threshold || questions > self.question_threshold
        {
            return Complexity::Complex;
        }

        Complexity::Medium
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Complexity {
        ClassifierRules::default().classify(&[Message::user(text)])
    }

    #[test]
    fn greeting_is_simple() {
        assert_eq!(classify("oi, bom dia"), Complexity::Simple);
        assert_eq!(classify("Obrigado pela ajuda!"), Complexity::Simple);
        assert_eq!(classify("Boa tarde"), Complexity::Simple);
    }

    #[test]
    fn complaint_is_complex() {
        assert_eq!(classify("minha internet não funciona"), Complexity::Complex);
        assert_eq!(classify("quero cancelar meu contrato"), Complexity::Complex);
        assert_eq!(classify("vou acionar o jurídico"), Complexity::Complex);
    }

    #[test]
    fn long_message_is_complex() {
        let long = "a".repeat(151);
        assert_eq!(classify(&long), Complexity::Complex);
        let short = "a".repeat(150);
        assert_eq!(classify(&short), Complexity::Medium);
    }

    #[test]
    fn multiple_questions_are_complex() {
        assert_eq!(
            classify("qual meu plano? quanto custa?"),
            Complexity::Complex
        );
        // A single question mark stays medium.
        assert_eq!(classify("qual meu plano atual?"), Complexity::Medium);
    }

    #[test]
    fn plain_question_is_medium() {
        assert_eq!(classify("como troco minha senha do wifi"), Complexity::Medium);
    }

    #[test]
    fn no_user_message_defaults_to_medium() {
        let rules = ClassifierRules::default();
        assert_eq!(rules.classify(&[]), Complexity::Medium);
        assert_eq!(
            rules.classify(&[Message::system("contexto"), Message::assistant("Olá")]),
            Complexity::Medium
        );
    }

    #[test]
    fn uses_most_recent_user_message() {
        let rules = ClassifierRules::default();
        let conv = [
            Message::user("minha internet não funciona"),
            Message::assistant("Sinto muito, vou verificar."),
            Message::user("obrigado"),
        ];
        assert_eq!(rules.classify(&conv), Complexity::Simple);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("OI, TUDO BEM"), Complexity::Simple);
        assert_eq!(classify("ERRO na fatura"), Complexity::Complex);
    }

    #[test]
    fn custom_rules_override_defaults() {
        let rules = ClassifierRules {
            simple_keywords: vec!["ping".into()],
            complex_keywords: vec!["outage".into()],
            length_threshold: 10,
            question_threshold: 0,
        };
        assert_eq!(rules.classify(&[Message::user("ping")]), Complexity::Simple);
        assert_eq!(
            rules.classify(&[Message::user("outage")]),
            Complexity::Complex
        );
        assert_eq!(
            rules.classify(&[Message::user("hello?")]),
            Complexity::Complex
        );
        assert_eq!(rules.classify(&[Message::user("hello")]), Complexity::Medium);
    }
}
