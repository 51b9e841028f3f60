//! HTML rendering with minijinja.
//!
//! Templates are read once from `<template_dir>/layouts/*.html` and
//! `<template_dir>/views/*.html` and registered under their relative names, so a
//! view starts with `{% extends "layouts/base.html" %}`.

use crate::{
    auth::ValidationErrors,
    config::{Contact, Group, Logo},
};
use minijinja::Environment;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub const VIEW_LOGIN: &str = "views/login.html";
pub const VIEW_DASHBOARD: &str = "views/dashboard.html";
pub const VIEW_NOT_FOUND: &str = "views/404.html";

const REQUIRED_VIEWS: [&str; 3] = [VIEW_LOGIN, VIEW_DASHBOARD, VIEW_NOT_FOUND];
const TEMPLATE_SUBDIRS: [&str; 2] = ["layouts", "views"];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read templates from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing template {0}")]
    Missing(String),
    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

/// Everything a page template can see.
#[derive(Debug, Serialize)]
pub struct Page<'a> {
    pub title: &'a str,
    pub logo: &'a Logo,
    pub contact: &'a Contact,
    pub groups: &'a [Group],
    pub errors: ValidationErrors,
    pub csrf: &'a str,
    pub logged_in: bool,
    pub user: Option<&'a str>,
}

impl<'a> Page<'a> {
    #[must_use]
    pub fn new(title: &'a str, logo: &'a Logo, contact: &'a Contact) -> Self {
        Self {
            title,
            logo,
            contact,
            groups: &[],
            errors: ValidationErrors::default(),
            csrf: "",
            logged_in: false,
            user: None,
        }
    }

    #[must_use]
    pub fn with_groups(mut self, groups: &'a [Group]) -> Self {
        self.groups = groups;
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: ValidationErrors) -> Self {
        self.errors = errors;
        self
    }

    #[must_use]
    pub fn with_csrf(mut self, csrf: &'a str) -> Self {
        self.csrf = csrf;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: Option<&'a str>) -> Self {
        self.logged_in = user.is_some();
        self.user = user;
        self
    }
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Load and compile every template under `dir`.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be read, a template does not
    /// compile, or one of the views the server needs is missing.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        let mut sources = Vec::new();
        for subdir in TEMPLATE_SUBDIRS {
            let path = dir.join(subdir);
            let entries = fs::read_dir(&path).map_err(|source| RenderError::Read {
                path: path.clone(),
                source,
            })?;
            for entry in entries {
                let file = entry
                    .map_err(|source| RenderError::Read {
                        path: path.clone(),
                        source,
                    })?
                    .path();
                if file.extension().and_then(|ext| ext.to_str()) != Some("html") {
                    continue;
                }
                let Some(file_name) = file.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                let name = format!("{subdir}/{file_name}");
                let source = fs::read_to_string(&file).map_err(|source| RenderError::Read {
                    path: file.clone(),
                    source,
                })?;
                debug!(template = %name, "Template loaded");
                sources.push((name, source));
            }
        }
        Self::from_sources(sources)
    }

    /// Build from in-memory `(name, source)` pairs.
    ///
    /// # Errors
    /// Returns an error if a template does not compile or a required view is missing.
    pub fn from_sources<I>(sources: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env = Environment::new();
        for (name, source) in sources {
            env.add_template_owned(name, source)?;
        }
        for view in REQUIRED_VIEWS {
            if env.get_template(view).is_err() {
                return Err(RenderError::Missing(view.to_string()));
            }
        }
        Ok(Self { env })
    }

    /// Render one view.
    ///
    /// # Errors
    /// Returns an error if the view is unknown or fails to render.
    pub fn render(&self, view: &str, page: &Page<'_>) -> Result<String, RenderError> {
        Ok(self.env.get_template(view)?.render(page)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sources() -> Vec<(String, String)> {
        vec![
            (
                "layouts/base.html".to_string(),
                "<title>{{ title }}</title>{% block content %}{% endblock %}".to_string(),
            ),
            (
                VIEW_LOGIN.to_string(),
                r#"{% extends "layouts/base.html" %}{% block content %}csrf={{ csrf }};{% if errors.global %}err={{ errors.global }}{% endif %}{% endblock %}"#
                    .to_string(),
            ),
            (
                VIEW_DASHBOARD.to_string(),
                r#"{% extends "layouts/base.html" %}{% block content %}{% for group in groups %}[{{ group.name }}]{% endfor %}{{ user }}{% endblock %}"#
                    .to_string(),
            ),
            (
                VIEW_NOT_FOUND.to_string(),
                r#"{% extends "layouts/base.html" %}{% block content %}gone{% endblock %}"#.to_string(),
            ),
        ]
    }

    #[test]
    fn renders_view_through_layout() {
        let renderer = Renderer::from_sources(sources()).unwrap();
        let (logo, contact) = (Logo::default(), Contact::default());
        let mut errors = ValidationErrors::default();
        errors.global("Invalid request session");

        let html = renderer
            .render(
                VIEW_LOGIN,
                &Page::new("Login Page", &logo, &contact)
                    .with_csrf("t0k")
                    .with_errors(errors),
            )
            .unwrap();
        assert!(html.contains("<title>Login Page</title>"));
        assert!(html.contains("csrf=t0k;"));
        assert!(html.contains("err=Invalid request session"));
    }

    #[test]
    fn values_are_html_escaped() {
        let renderer = Renderer::from_sources(sources()).unwrap();
        let (logo, contact) = (Logo::default(), Contact::default());
        let html = renderer
            .render(
                VIEW_DASHBOARD,
                &Page::new("Dashboard", &logo, &contact).with_user(Some("<b>admin</b>")),
            )
            .unwrap();
        assert!(html.contains("&lt;b&gt;admin&lt;/b&gt;"));
    }

    #[test]
    fn missing_view_is_rejected() {
        let mut partial = sources();
        partial.retain(|(name, _)| name != VIEW_NOT_FOUND);
        assert!(matches!(
            Renderer::from_sources(partial),
            Err(RenderError::Missing(view)) if view == VIEW_NOT_FOUND
        ));
    }

    #[test]
    fn load_reads_template_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (name, source) in sources() {
            let path = dir.path().join(&name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, source).unwrap();
        }
        fs::write(dir.path().join("views/notes.txt"), "ignored").unwrap();
        assert!(Renderer::load(dir.path()).is_ok());
    }

    #[test]
    fn load_fails_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Renderer::load(dir.path()),
            Err(RenderError::Read { .. })
        ));
    }

    #[test]
    fn shipped_templates_compile() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        assert!(Renderer::load(&dir).is_ok());
    }
}
