use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("template name", "must not be empty"));
        }
        if self.subject.trim().is_empty() {
            return Err(DomainError::validation("template subject", "must not be empty"));
        }
        scan(&self.subject)?;
        scan(&self.body)?;
        Ok(())
    }

    /// `{{placeholder}}` names in subject then body, first appearance order.
    pub fn placeholders(&self) -> Result<Vec<String>, DomainError> {
        let mut names: Vec<String> = Vec::new();
        for text in [&self.subject, &self.body] {
            for segment in scan(text)? {
                if let Segment::Placeholder(name) = segment {
                    if !names.iter().any(|known| known == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    pub fn render(&self, values: &HashMap<String, String>) -> Result<RenderedEmail, DomainError> {
        Ok(RenderedEmail {
            subject: render_text(&self.subject, values)?,
            body: render_text(&self.body, values)?,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn scan(text: &str) -> Result<Vec<Segment<'_>>, DomainError> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Literal(&rest[..open]));
        }
        let after_open = &rest[open + 2..];
        let close = after_open.find("}}").ok_or_else(|| {
            DomainError::validation("template", "unterminated {{ placeholder")
        })?;
        let name = after_open[..close].trim();
        if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(DomainError::validation(
                "template",
                format!("invalid placeholder name {name:?}"),
            ));
        }
        segments.push(Segment::Placeholder(name));
        rest = &after_open[close + 2..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

fn render_text(text: &str, values: &HashMap<String, String>) -> Result<String, DomainError> {
    let mut out = String::with_capacity(text.len());
    for segment in scan(text)? {
        match segment {
            Segment::Literal(literal) => out.push_str(literal),
            Segment::Placeholder(name) => {
                let value = values.get(name).ok_or_else(|| {
                    DomainError::validation("template", format!("no value for {{{{{name}}}}}"))
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}
