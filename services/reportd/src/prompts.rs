//! Prompt assembly for report sections. The template text is deliberately
//! plain; the interesting behavior lives in the lifecycle crate.

use serde_json::Value;

use crate::weather::WeatherSummary;

pub const SYSTEM_PROMPT: &str = "You are a forensic engineer writing professional engineering \
report sections. Write in a precise, objective register. State observations before opinions and \
never speculate beyond the provided facts.";

pub fn section_instruction(section: &str) -> &'static str {
    match section {
        "introduction" => {
            "Write the Introduction: purpose of the investigation, parties involved, and the \
             scope of this report."
        }
        "background" => {
            "Write the Background: the reported loss event, relevant property history, and the \
             circumstances leading to this assignment."
        }
        "site_observations" => {
            "Write the Site Observations: conditions documented during the inspection, organized \
             by area, citing only what was observed."
        }
        "weather_conditions" => {
            "Write the Weather Conditions section: describe conditions at the site on the date \
             of loss using the provided weather data."
        }
        "analysis" => {
            "Write the Analysis: evaluate the evidence against the candidate causes of loss and \
             explain the reasoning that supports or excludes each."
        }
        "conclusions" => {
            "Write the Conclusions: the determined cause of loss and the key findings, stated to \
             a reasonable degree of engineering certainty."
        }
        _ => "Write the requested report section based on the provided context.",
    }
}

pub fn build_section_prompt(
    section: &str,
    context: &Value,
    weather: Option<&WeatherSummary>,
    custom_instructions: Option<&str>,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(section_instruction(section));

    prompt.push_str("\n\nClaim context:\n");
    prompt.push_str(
        &serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string()),
    );

    if let Some(w) = weather {
        prompt.push_str("\n\nHistorical weather for the date of loss: ");
        prompt.push_str(&w.narrative());
    }

    if let Some(extra) = custom_instructions {
        prompt.push_str("\n\nAdditional instructions: ");
        prompt.push_str(extra);
    }

    prompt
}
