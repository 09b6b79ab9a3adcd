#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;
use yansi::Color;
use yansi::Paint;
use yansi::Style;

use crate::domain::models::Role;
use crate::domain::models::Turn;

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| return Regex::new(r"\n{3,}").unwrap());

/// Normalises model output before it reaches a Markdown/LaTeX renderer.
/// `\[ ... \]` display math becomes `$$ ... $$`, and runs of three or more
/// newlines collapse to a single blank line. Applying it twice is a no-op.
pub fn transform(text: &str) -> String {
    let text = text.replace("\\[", "$$").replace("\\]", "$$");
    return BLANK_RUNS.replace_all(&text, "\n\n").to_string();
}

pub struct Transcript {
    colors: bool,
}

impl Transcript {
    pub fn new(colors: bool) -> Transcript {
        return Transcript { colors };
    }

    fn style(role: Role) -> Style {
        match role {
            Role::User => return Style::new(Color::Cyan).bold(),
            Role::Assistant => return Style::new(Color::Blue).bold(),
        }
    }

    pub fn render_turn(&self, turn: &Turn) -> String {
        let mut label = turn.role.label();
        if self.colors {
            label = Paint::new(label)
                .with_style(Transcript::style(turn.role))
                .to_string();
        }

        return format!("{label}\n{}", transform(&turn.content));
    }

    /// Turns in insertion order, separated by a blank line.
    pub fn render(&self, turns: &[Turn]) -> String {
        return turns
            .iter()
            .map(|turn| return self.render_turn(turn))
            .collect::<Vec<String>>()
            .join("\n\n");
    }
}
