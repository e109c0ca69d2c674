use std::process::Command;

use crate::types::{
    Prompt, PromptVersion, CATEGORY_OPTIONS, OUTPUT_FORMAT_OPTIONS, TASK_TYPE_OPTIONS,
};

/// Detect the user's preferred pager.
/// Checks PROMPTDECK_PAGER -> PAGER -> "less"
pub fn detect_pager() -> String {
    ["PROMPTDECK_PAGER", "PAGER"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|pager| !pager.trim().is_empty())
        .unwrap_or_else(|| "less".to_string())
}

/// Pipe content to the pager's stdin and wait for it to exit.
pub fn open_pager(content: &str, pager_cmd: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new("sh")
        .args(["-c", pager_cmd])
        .stdin(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // Dropping stdin closes the pipe. A pager that quits early breaks it.
        let _ = stdin.write_all(content.as_bytes());
    }

    child.wait()?;
    Ok(())
}

/// Display label for a stored option value, or the value itself.
pub fn option_label<'a>(options: &'a [(&'a str, &'a str)], value: &'a str) -> &'a str {
    options
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, label)| *label)
        .unwrap_or(value)
}

/// The whole prompt as a plain-text document.
pub fn render_prompt_document(prompt: &Prompt) -> String {
    let mut out = String::new();
    out.push_str(&prompt.title);
    out.push('\n');
    out.push_str(&"=".repeat(prompt.title.chars().count().max(3)));
    out.push_str("\n\n");

    let mut meta = vec![
        format!("Author:   {}", prompt.author),
        format!("Status:   {} ({})", prompt.status, prompt.visibility),
        format!(
            "Votes:    {} ({} up / {} down)   Copies: {}",
            prompt.vote_count, prompt.like_count, prompt.dislike_count, prompt.copy_count
        ),
    ];
    for (label, options, value) in [
        ("Dept", CATEGORY_OPTIONS, &prompt.category),
        ("Task", TASK_TYPE_OPTIONS, &prompt.task_type),
        ("Output", OUTPUT_FORMAT_OPTIONS, &prompt.output_format),
    ] {
        if !value.is_empty() {
            meta.push(format!("{:<9} {}", format!("{}:", label), option_label(options, value)));
        }
    }
    if let Some(created) = prompt.created_at {
        meta.push(format!("Created:  {}", created.format("%Y-%m-%d")));
    }
    out.push_str(&meta.join("\n"));
    out.push_str("\n\n");

    for (heading, body) in [
        ("Description", &prompt.description),
        ("Prompt", &prompt.text),
        ("Guidance", &prompt.guidance),
        ("Intended use", &prompt.intended_use),
    ] {
        if body.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n\n{}\n\n", heading, body.trim_end()));
    }
    out
}

/// Saved revisions of a prompt, newest first.
pub fn render_history_document(title: &str, versions: &[PromptVersion]) -> String {
    let heading = format!("History: {}", title);
    let mut out = format!("{}\n{}\n\n", heading, "=".repeat(heading.chars().count()));
    if versions.is_empty() {
        out.push_str("No earlier versions.\n");
        return out;
    }

    for (n, version) in versions.iter().enumerate().rev() {
        let mut line = format!("## Version {}: {}", n + 1, version.title);
        if !version.edited_by.is_empty() {
            line.push_str(&format!(" (by {})", version.edited_by));
        }
        if let Some(at) = version.created_at {
            line.push_str(&format!(", {}", at.format("%Y-%m-%d %H:%M")));
        }
        out.push_str(&line);
        out.push_str("\n\n");
        for body in [&version.description, &version.text, &version.guidance] {
            if !body.trim().is_empty() {
                out.push_str(body.trim_end());
                out.push_str("\n\n");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::prompt;

    #[test]
    fn document_has_sections_for_present_fields() {
        let mut p = prompt(1);
        p.title = "Summarize".into();
        p.description = "Short notes".into();
        p.category = "hr".into();
        let doc = render_prompt_document(&p);
        assert!(doc.starts_with("Summarize\n=========\n"));
        assert!(doc.contains("## Description\n\nShort notes"));
        assert!(doc.contains("## Prompt\n\ntemplate 1"));
        assert!(!doc.contains("## Guidance"));
        assert!(doc.contains("Author:   ana"));
    }

    fn version(title: &str, text: &str) -> PromptVersion {
        PromptVersion {
            id: 0,
            title: title.into(),
            description: String::new(),
            text: text.into(),
            guidance: String::new(),
            edited_by: "bo".into(),
            created_at: None,
        }
    }

    #[test]
    fn history_lists_newest_first() {
        let doc = render_history_document(
            "Summarize",
            &[version("Draft", "v1 text"), version("Summarize", "v2 text")],
        );
        assert!(doc.starts_with("History: Summarize\n"));
        let v2 = doc.find("## Version 2: Summarize (by bo)").unwrap();
        let v1 = doc.find("## Version 1: Draft (by bo)").unwrap();
        assert!(v2 < v1);
        assert!(doc.contains("v1 text"));
    }

    #[test]
    fn empty_history_says_so() {
        let doc = render_history_document("x", &[]);
        assert!(doc.ends_with("No earlier versions.\n"));
    }

    #[test]
    fn unknown_option_value_shown_raw() {
        assert_eq!(option_label(CATEGORY_OPTIONS, "zzz"), "zzz");
    }
}
