/// Prompt asking for a short bullet-point summary of one article.
pub fn summary_prompt(title: &str, content: &str) -> String {
    format!(
        r#"Summarize this crypto news article in 2–3 concise bullet points.
Start every bullet with "- " and put each bullet on its own line.

Title: {title}

Content: {content}"#,
        title = title,
        content = content
    )
}

/// Prompt asking for the topics an article's summary is about.
pub fn keywords_prompt(title: &str, summary_lines: &[String]) -> String {
    format!(
        r#"Extract 3–4 important keywords or topics from this crypto news article. Return as a bullet list.

{title}

{summary}"#,
        title = title,
        summary = summary_lines.join(" ")
    )
}
