use minijinja::{context, Environment};

use crate::intent::IntentResult;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("prompts/system_prompt.j2");

pub const INTENT_ANNOTATION: &str =
    "[SIMULATED API RESPONSE - Include this in your answer naturally]";

pub struct SystemPromptContext<'a> {
    pub bot_name: &'a str,
    pub intent: &'a IntentResult,
}

/// Builds the persona instruction sent ahead of the conversation. Never fails:
/// template errors degrade to a plain-text prompt with the same ingredients.
pub fn assemble_system_prompt(ctx: &SystemPromptContext<'_>) -> String {
    let intent_payload = intent_payload(ctx.intent);

    let mut env = Environment::new();
    if env
        .add_template("system_prompt", SYSTEM_PROMPT_TEMPLATE)
        .is_err()
    {
        return fallback_system_prompt(ctx.bot_name, intent_payload.as_deref());
    }

    let Ok(template) = env.get_template("system_prompt") else {
        return fallback_system_prompt(ctx.bot_name, intent_payload.as_deref());
    };

    template
        .render(context! {
            bot_name => display_bot_name(ctx.bot_name),
            has_intent => intent_payload.is_some(),
            intent_annotation => INTENT_ANNOTATION,
            intent_payload => intent_payload.as_deref().unwrap_or(""),
        })
        .unwrap_or_else(|_| fallback_system_prompt(ctx.bot_name, intent_payload.as_deref()))
}

fn intent_payload(intent: &IntentResult) -> Option<String> {
    if intent.is_none() {
        return None;
    }
    serde_json::to_string_pretty(intent).ok()
}

fn display_bot_name(bot_name: &str) -> &str {
    if bot_name.trim().is_empty() {
        "Eric"
    } else {
        bot_name.trim()
    }
}

fn fallback_system_prompt(bot_name: &str, intent_payload: Option<&str>) -> String {
    let mut prompt = format!(
        "You are {}, an AI chatbot DEMO/SHOWCASE.\n\
         You demonstrate what AI chatbots can do using dummy data, you are not a real business bot.\n\
         Showcase products, order tracking, appointment booking and your overall capabilities.\n\
         Rules: always make clear the data is simulated, respond in the user's language, \
         keep responses short (2-4 paragraphs), use bullets and line breaks, \
         never mention specific companies or websites.\n",
        display_bot_name(bot_name)
    );

    if let Some(payload) = intent_payload {
        prompt.push('\n');
        prompt.push_str(INTENT_ANNOTATION);
        prompt.push_str(":\n");
        prompt.push_str(payload);
        prompt.push('\n');
    }

    prompt
}
