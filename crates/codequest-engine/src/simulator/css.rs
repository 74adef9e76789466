//! A stylesheet attached to a single preview element.
//!
//! Input is one or more rules. Block at-rules such as `@media` and
//! `@keyframes` are flattened: each inner rule is stored with the at-rule's
//! prelude as its context.

use codequest_types::{Declaration, StyleRule, StylesheetSnapshot};

use super::CommandOutcome;

/// The preview element and the rules applied to it so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetWorld {
    sheet: StylesheetSnapshot,
}

impl StylesheetWorld {
    /// Start from a level's preview.
    pub fn new(snapshot: &StylesheetSnapshot) -> Self {
        Self {
            sheet: snapshot.clone(),
        }
    }

    /// Current element and rules.
    pub fn snapshot(&self) -> StylesheetSnapshot {
        self.sheet.clone()
    }

    /// Parse `input` and append its rules to the sheet.
    pub fn apply(&mut self, input: &str) -> CommandOutcome {
        match parse_rules(input, None) {
            Some(rules) if !rules.is_empty() => {
                let rendered = rules.iter().map(format_rule).collect::<Vec<_>>().join("\n");
                self.sheet.rules.extend(rules);
                CommandOutcome::changed(format!("Applied to {}:\n{rendered}", self.sheet.element))
            }
            _ => CommandOutcome::output(format!(
                "Error: \"{}\" is not a valid CSS rule",
                input.trim()
            )),
        }
    }
}

/// Render a rule as a single line of CSS.
pub fn format_rule(rule: &StyleRule) -> String {
    let body = rule
        .declarations
        .iter()
        .map(|d| format!("{}: {};", d.property, d.value))
        .collect::<Vec<_>>()
        .join(" ");
    let inner = if body.is_empty() {
        format!("{} {{ }}", rule.selector)
    } else {
        format!("{} {{ {body} }}", rule.selector)
    };
    match &rule.context {
        Some(context) => format!("{context} {{ {inner} }}"),
        None => inner,
    }
}

/// Parse a sequence of rules. `None` when the text is malformed.
fn parse_rules(text: &str, context: Option<&str>) -> Option<Vec<StyleRule>> {
    let mut rules = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let open = rest.find('{')?;
        let prelude = rest.get(..open)?.trim();
        if prelude.is_empty() || prelude.contains(['}', ';']) {
            return None;
        }
        let close = matching_brace(rest, open)?;
        let body = rest.get(open.checked_add(1)?..close)?;

        if prelude.starts_with('@') {
            if context.is_some() {
                return None;
            }
            rules.extend(parse_rules(body, Some(prelude))?);
        } else {
            if body.contains('{') {
                return None;
            }
            rules.push(StyleRule {
                context: context.map(str::to_owned),
                selector: prelude.split_whitespace().collect::<Vec<_>>().join(" "),
                declarations: parse_declarations(body)?,
            });
        }
        rest = rest.get(close.checked_add(1)?..)?.trim_start();
    }
    Some(rules)
}

/// Byte offset of the `}` closing the `{` at `open`.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '{' => depth = depth.checked_add(1)?,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_declarations(body: &str) -> Option<Vec<Declaration>> {
    body.split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            let (property, value) = d.split_once(':')?;
            let property = property.trim();
            let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
            let valid_name = !property.is_empty()
                && property
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-');
            (valid_name && !value.is_empty()).then(|| Declaration {
                property: property.to_owned(),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn heading() -> StylesheetWorld {
        StylesheetWorld::new(&StylesheetSnapshot {
            element: "h1 \"Hello CodeQuest!\"".to_owned(),
            rules: Vec::new(),
        })
    }

    #[test]
    fn single_rule_is_appended() {
        let mut world = heading();
        let out = world.apply("h1 { color: purple; }");
        assert!(out.mutated);
        let rules = world.snapshot().rules;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].selector, "h1");
        assert_eq!(rules[0].declarations[0].property, "color");
        assert_eq!(rules[0].declarations[0].value, "purple");
        assert!(out.display.ends_with("h1 { color: purple; }"));
    }

    #[test]
    fn values_keep_commas_and_parentheses() {
        let mut world = heading();
        world.apply(".box { background: linear-gradient(to right, #3b82f6, #1e40af) }");
        let rule = &world.snapshot().rules[0];
        assert_eq!(
            rule.declarations[0].value,
            "linear-gradient(to right, #3b82f6, #1e40af)"
        );
    }

    #[test]
    fn media_block_sets_context() {
        let mut world = heading();
        world.apply("@media (max-width: 768px) { .element { display: none; } }");
        let rule = &world.snapshot().rules[0];
        assert_eq!(rule.context.as_deref(), Some("@media (max-width: 768px)"));
        assert_eq!(rule.selector, ".element");
    }

    #[test]
    fn keyframes_and_following_rule() {
        let mut world = heading();
        world.apply(
            "@keyframes fadeIn { from { opacity: 0; } to { opacity: 1; } } .element { animation: fadeIn 1s; }",
        );
        let rules = world.snapshot().rules;
        let selectors: Vec<&str> = rules.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec!["from", "to", ".element"]);
        assert_eq!(rules[2].context, None);
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in [
            "color: purple;",
            "h1 { color purple; }",
            "h1 { color: purple;",
            "{ color: red; }",
            "h1 { a { b: c; } }",
        ] {
            let mut world = heading();
            let out = world.apply(bad);
            assert!(!out.mutated, "{bad}");
            assert_eq!(out.display, format!("Error: \"{bad}\" is not a valid CSS rule"));
            assert!(world.snapshot().rules.is_empty());
        }
    }
}
