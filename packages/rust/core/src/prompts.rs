//! Prompt templates for the generation backend.
//!
//! Pure string builders: no I/O, no state. Document-specific content
//! rules live here as data so the steps stay generic.

/// Prompt for drafting a new devlog entry.
pub fn devlog_entry_prompt(date: &str, task: &str, results: &[String], next_steps: &[String]) -> String {
    let done = bulleted(results);
    let next = bulleted(next_steps);

    format!(
        "You are updating a development worklog for a software project.\n\
         Write one worklog entry in Markdown with exactly this structure:\n\
         \n\
         ### {date} - {task}\n\
         \n\
         **Accomplished:**\n\
         {done}\n\
         \n\
         **Next steps:**\n\
         {next}\n\
         \n\
         Keep the entry clear, concise, and informative. Return only the entry."
    )
}

/// Prompt for rewriting a whole tracked document. `instructions` is the
/// document-specific rule text; `content` is the current file body.
pub fn rewrite_prompt(instructions: &str, content: &str) -> String {
    format!(
        "{instructions}\n\
         \n\
         ```markdown\n\
         {content}\n\
         ```\n\
         \n\
         Return the complete document as valid Markdown."
    )
}

/// Prompt for rendering the final execution report.
#[allow(clippy::too_many_arguments)]
pub fn report_prompt(
    name: &str,
    status: &str,
    completed: usize,
    total: usize,
    step_names: &str,
    errors: &str,
    elapsed: &str,
) -> String {
    format!(
        "Summarize this documentation-update pipeline run as a short plain-text\n\
         report suitable for a terminal. Include the outcome, timing, and any\n\
         errors. Do not invent details.\n\
         \n\
         Pipeline: {name}\n\
         Status: {status}\n\
         Steps completed: {completed}/{total}\n\
         Step names: {step_names}\n\
         Errors: {errors}\n\
         Elapsed: {elapsed}"
    )
}

// Document-specific rewrite instructions.

pub const ARCHITECTURE_INSTRUCTIONS: &str = "The following document defines the project's \
architecture notes and technical guardrails. Update it by adding or correcting sections to \
reflect the latest changes to the project.";

pub const STRUCTURE_INSTRUCTIONS: &str = "The following document describes the project's \
directory layout and conventions. Update it to reflect the current structure and automation \
scripts.";

pub const TASKS_INSTRUCTIONS: &str = "The following document is the project's task board. \
Update it to reflect progress on existing tasks and add any newly discovered tasks.";

pub const REQUIREMENTS_INSTRUCTIONS: &str = "The following document lists the project's \
requirements. Update it to reflect new requirements and modifications to existing ones.";

fn bulleted(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devlog_prompt_contains_all_fields() {
        let prompt = devlog_entry_prompt(
            "2026-08-23",
            "wire up orchestrator",
            &["orchestrator runs".to_string()],
            &["add report renderer".to_string()],
        );
        assert!(prompt.contains("### 2026-08-23 - wire up orchestrator"));
        assert!(prompt.contains("- orchestrator runs"));
        assert!(prompt.contains("- add report renderer"));
    }

    #[test]
    fn empty_lists_render_a_placeholder_bullet() {
        let prompt = devlog_entry_prompt("2026-08-23", "t", &[], &[]);
        assert!(prompt.contains("- (none)"));
    }

    #[test]
    fn rewrite_prompt_embeds_document() {
        let prompt = rewrite_prompt(ARCHITECTURE_INSTRUCTIONS, "# Architecture\n\nBody.");
        assert!(prompt.starts_with("The following document defines"));
        assert!(prompt.contains("# Architecture"));
        assert!(prompt.contains("```markdown"));
    }
}
