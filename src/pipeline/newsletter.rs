//! Stage 4: the Markdown digest of the selected articles.

use crate::article::Article;
use crate::pipeline::DayStamp;

const LOGO_LINE: &str = "![Nethermind Logo](src/logo.png)";

/// Renders the daily brief for `day`.
pub fn render_newsletter(articles: &[Article], day: &DayStamp) -> String {
    let mut lines = vec![
        LOGO_LINE.to_string(),
        format!("# Daily Crypto Brief – {}", day.display_slashed()),
        "Here are the top 10 trending crypto stories based on Twitter engagement.\n".to_string(),
    ];

    for (i, article) in articles.iter().enumerate() {
        lines.push(format!("## {}. {}", i + 1, article.title));
        lines.push(format!("**Source:** {}  ", article.source));
        lines.push(format!("**Retweets:** {}  ", article.retweets()));
        lines.push(format!(" [Read Article]({})\n", article.url));

        if !article.summary.is_empty() {
            lines.push("**Summary:**".to_string());
            lines.extend(article.summary.iter().map(|bullet| format!("- {}", bullet)));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
