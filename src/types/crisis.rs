//! Crisis support card

use colored::Colorize;
use serde::Serialize;

/// Fixed emergency-support payload shown instead of (or after) a model reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisCard {
    pub title: &'static str,
    pub hotline: &'static str,
    pub call_to_action: &'static str,
}

impl CrisisCard {
    /// Markup stored in the conversation and served to API clients
    pub fn markup(&self) -> String {
        format!(
            concat!(
                "<div style=\"background-color: #1C1C1E; border: 1px solid #FF453A; ",
                "border-radius: 16px; padding: 20px; margin: 20px 0;\">\n",
                "    <div style=\"color: #FF453A; font-weight: bold; font-size: 18px;\">{}</div>\n",
                "    <div style=\"font-size: 24px; font-weight: 600; margin: 10px 0; color: #FFFFFF;\">{}</div>\n",
                "    <div style=\"color: #E0E0E0;\">{}</div>\n",
                "</div>"
            ),
            self.title, self.hotline, self.call_to_action
        )
    }

    /// Boxed block for the terminal
    pub fn to_terminal_string(&self, color: bool) -> String {
        let rule = "━".repeat(44);
        if !color {
            return format!(
                "{rule}\n  {}\n  {}\n  {}\n{rule}",
                self.title, self.hotline, self.call_to_action
            );
        }
        format!(
            "{}\n  {}\n  {}\n  {}\n{}",
            rule.red(),
            self.title.red().bold(),
            self.hotline.white().bold(),
            self.call_to_action,
            rule.red()
        )
    }
}
