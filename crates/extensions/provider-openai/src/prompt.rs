//! System prompt for the rewrite call.

use enhancer_protocols::{EnhanceRequest, MessageKind, Tone};

const BASE: &str = "You are a professional message enhancer. Your task is to improve the given text by:";
const CLARITY: &str = "\n1. Enhancing clarity and readability";
const GRAMMAR: &str = "\n2. Fixing grammar and punctuation";
const MEANING: &str = "\n3. Maintaining the original meaning";

const TRANSLATE: &str = "Translating the text to English while preserving its original meaning and intent";
const KEEP_LANGUAGE: &str = "Do not translate the content/text, keep it in its original language";

const EMAIL: &str =
    "\n\nThis is an email message. Ensure it follows proper email etiquette and structure. But keep it informal and friendly.";
const CHAT: &str = "This is not an email message, it's a message in a chat/group chat";

const FINAL: &str = "\n\nProvide only the enhanced text without any explanations or additional comments.";

fn tone_lines(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::VeryInformal => &[
            "\n4. Making the tone very casual and friendly",
            "\n5. Using conversational language and common expressions",
            "\n6. Be informal",
        ],
        Tone::Informal => &[
            "\n4. Keeping a relaxed but professional tone",
            "\n5. Using friendly but appropriate language",
            "Don't be formal",
        ],
        Tone::Neutral => &[
            "\n4. Maintaining a balanced and professional tone, but not too formal",
            "\n5. Using clear and straightforward language",
        ],
        Tone::Formal => &[
            "\n4. Using formal and professional language",
            "\n5. Maintaining a respectful and business-appropriate tone",
        ],
    }
}

/// Build the system message for `request`.
///
/// The user's text is sent separately as the user message and never appears
/// here.
pub fn system_prompt(request: &EnhanceRequest) -> String {
    let mut prompt = String::from(BASE);
    prompt.push_str(CLARITY);
    prompt.push_str(GRAMMAR);
    prompt.push_str(MEANING);

    prompt.push_str("\n3. ");
    prompt.push_str(if request.translate { TRANSLATE } else { KEEP_LANGUAGE });

    for line in tone_lines(request.tone) {
        prompt.push_str(line);
    }

    prompt.push_str(match request.kind {
        MessageKind::Email => EMAIL,
        MessageKind::Message => CHAT,
    });

    prompt.push_str(FINAL);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_prompt() {
        let prompt = system_prompt(&EnhanceRequest::new("hello"));
        assert!(prompt.starts_with(BASE));
        assert!(prompt.contains("\n3. Do not translate the content/text"));
        assert!(prompt.contains("balanced and professional tone, but not too formal"));
        assert!(prompt.contains("chat/group chat"));
        assert!(!prompt.contains("email etiquette"));
        assert!(prompt.ends_with("without any explanations or additional comments."));
        assert!(!prompt.contains("hello"));
    }

    #[test]
    fn test_translate_line() {
        let prompt = system_prompt(&EnhanceRequest::new("olá").with_translate(true));
        assert!(prompt.contains("\n3. Translating the text to English"));
        assert!(!prompt.contains("Do not translate"));
    }

    #[test]
    fn test_email_formal() {
        let prompt = system_prompt(
            &EnhanceRequest::new("x")
                .with_tone(Tone::Formal)
                .with_kind(MessageKind::Email),
        );
        assert!(prompt.contains("\n4. Using formal and professional language"));
        assert!(prompt.contains("\n\nThis is an email message."));
        assert!(!prompt.contains("chat/group chat"));
    }

    #[test]
    fn test_every_tone_has_lines() {
        for tone in Tone::ALL {
            let prompt = system_prompt(&EnhanceRequest::new("x").with_tone(tone));
            assert!(prompt.contains("\n4. "), "{} is missing its tone lines", tone);
            assert!(prompt.contains("\n5. "));
        }
        let very = system_prompt(&EnhanceRequest::new("x").with_tone(Tone::VeryInformal));
        assert!(very.contains("\n6. Be informal"));
        let informal = system_prompt(&EnhanceRequest::new("x").with_tone(Tone::Informal));
        assert!(informal.contains("appropriate languageDon't be formal"));
    }
}
