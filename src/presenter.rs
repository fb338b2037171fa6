//! Text rendering of canonical records, errors, and assistant replies.
//!
//! Rendering is deterministic and field-complete: every canonical field of
//! every patient appears, in a fixed order, behind a fixed icon+label
//! prefix — defaults included. Values render verbatim, so a caller can
//! grep the labels back out of the text and recover exactly what went in.
//! All output is plain text; any markup is the caller's concern.

use crate::directory::DirectoryError;
use crate::fields::CanonicalPatient;
use crate::tools::ToolSpec;

/// Rendered when a list field resolved to the empty list.
const NONE_REPORTED: &str = "None reported";

/// Message for an empty result set — an answer, not a failure.
pub const NO_RESULTS: &str = "No patients found matching the specified criteria.";

// ═══════════════════════════════════════════
// Patient sets
// ═══════════════════════════════════════════

/// Render a patient set as a readable block.
///
/// Field lines keep a stable `icon Label: value` shape; the labels are the
/// contract, the icons are garnish.
pub fn render_patients(patients: &[CanonicalPatient]) -> String {
    if patients.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut lines = vec![format!("Found {} patient(s):", patients.len()), String::new()];

    for (index, patient) in patients.iter().enumerate() {
        lines.push(format!("📋 Patient #{}", index + 1));
        lines.push(format!("   👤 Name: {}", patient.name));
        lines.push(format!("   🆔 ID: {}", patient.id));
        lines.push(format!("   🎂 Age: {}", patient.age));
        lines.push(format!("   🏥 Diagnosis: {}", patient.diagnosis));
        lines.push(format!("   💊 Medications: {}", render_list(&patient.medications)));
        lines.push(format!("   ⚠️ Allergies: {}", render_list(&patient.allergies)));
        lines.push(format!("   📅 Last Updated: {}", patient.last_updated));
        lines.push(format!("   🏢 Department: {}", patient.department));
        lines.push(format!("   📊 Status: {}", patient.status));
        lines.push(format!("   📆 Admitted: {}", patient.admitted));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        NONE_REPORTED.to_string()
    } else {
        items.join(", ")
    }
}

// ═══════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════

/// Render an upstream failure as a stable, user-readable message.
///
/// The raw failure detail stays in the logs; users get one sentence per
/// failure kind.
pub fn render_error(err: &DirectoryError) -> String {
    match err {
        DirectoryError::Unreachable(_) => {
            "❌ The patient directory is unreachable right now. Please try again in a moment."
                .to_string()
        }
        DirectoryError::Status { code } => format!(
            "❌ The patient directory rejected the request (status {code})."
        ),
        DirectoryError::Malformed(_) => {
            "❌ The patient directory returned a response I couldn't read.".to_string()
        }
    }
}

// ═══════════════════════════════════════════
// Conversational replies
// ═══════════════════════════════════════════

/// Render the tool catalog.
pub fn render_tool_catalog(catalog: &[ToolSpec]) -> String {
    let mut lines = vec!["🧰 Available tools:".to_string()];
    for tool in catalog {
        lines.push(format!("  • {} — {}", tool.name, tool.description));
        for arg in tool.args {
            let requirement = if arg.required { "required" } else { "optional" };
            lines.push(format!(
                "      {} ({}, {}): {}",
                arg.name, arg.kind, requirement, arg.description
            ));
        }
    }
    lines.join("\n")
}

/// Render the help text.
pub fn render_help() -> String {
    [
        "I can look up patients in the directory for you. Try:",
        "  • \"show me all patients\"",
        "  • \"find patients named Smith\"",
        "  • \"find patients named Smith limit 5\"",
        "  • \"list tools\" to see what I can call",
        "Say \"hello\" any time, or ask for \"help\" to see this again.",
    ]
    .join("\n")
}

/// Render a greeting, personalised when a name was offered.
pub fn render_greeting(name: Option<&str>) -> String {
    match name {
        Some(name) => format!(
            "👋 Hello, {name}! Ask me about patients — for example \"find patients named Smith\"."
        ),
        None => "👋 Hello! Ask me about patients — for example \"find patients named Smith\"."
            .to_string(),
    }
}

/// Canned reply for an utterance no rule recognized.
pub fn render_fallback() -> String {
    "I didn't understand that. Ask me about patients (for example \"find patients named \
     Smith\"), or say \"help\" to see what I can do."
        .to_string()
}
