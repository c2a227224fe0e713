use serde::{Deserialize, Serialize};

use crate::{DomainError, GalleryPermissions, Privacy};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoSettings {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub slug: String,
}

/// Full settings object sent with the gallery settings PUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GallerySettings {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: GalleryPermissions,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub seo: SeoSettings,
    #[serde(default)]
    pub layout_id: Option<String>,
}

impl GallerySettings {
    /// Validates and canonicalizes the settings before they are sent.
    pub fn normalized(mut self) -> Result<Self, DomainError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }
        if let Privacy::Private { password } = &self.privacy {
            if password.trim().is_empty() {
                return Err(DomainError::validation(
                    "password",
                    "a private gallery needs a password",
                ));
            }
        }

        self.tags = normalize_tags(&self.tags);
        self.seo.keywords = normalize_tags(&self.seo.keywords);
        self.seo.slug = if self.seo.slug.trim().is_empty() {
            let derived = slugify(&self.name);
            if derived.is_empty() {
                return Err(DomainError::validation(
                    "seo.slug",
                    format!("cannot derive a slug from {:?}; set one explicitly", self.name),
                ));
            }
            derived
        } else {
            let slug = self.seo.slug.trim().to_string();
            if !is_valid_slug(&slug) {
                return Err(DomainError::validation(
                    "seo.slug",
                    format!("{slug:?} may only contain a-z, 0-9 and '-'"),
                ));
            }
            slug
        };
        Ok(self)
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
