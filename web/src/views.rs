//! Template rendering.
//!
//! Views are `.html` files under the configured views directory, rendered
//! with minijinja. Handlers name a view without its extension
//! (`views.render("404", ...)`), and every page gets the drained flash
//! messages as `success`, `error`, `warning` and `info`.

use crate::error::{AppError, StartupError};
use axum::response::Html;
use minijinja::{Environment, path_loader};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use storefront_session::FlashMessages;

/// Extension appended to view names.
pub const VIEW_EXTENSION: &str = "html";

/// View that must exist for the views directory to be usable.
const REQUIRED_VIEW: &str = "404";

/// Shared template environment.
#[derive(Clone, Debug)]
pub struct Views {
    env: Arc<Environment<'static>>,
}

impl Views {
    /// Load views lazily from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Views`] if `dir` is not a directory or the
    /// not-found view cannot be compiled.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, StartupError> {
        let dir = dir.as_ref();
        let views_error = |reason: String| StartupError::Views {
            path: dir.display().to_string(),
            reason,
        };

        if !dir.is_dir() {
            return Err(views_error("not a directory".to_string()));
        }

        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        env.get_template(&file_name(REQUIRED_VIEW))
            .map_err(|e| views_error(e.to_string()))?;

        tracing::info!(path = %dir.display(), "Views loaded");
        Ok(Self { env: Arc::new(env) })
    }

    /// Build views from in-memory sources, keyed by view name.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Views`] if a template does not compile.
    pub fn from_templates<'a>(
        templates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, StartupError> {
        let mut env = Environment::new();
        for (name, source) in templates {
            env.add_template_owned(file_name(name), source.to_string())
                .map_err(|e| StartupError::Views {
                    path: name.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    /// Render the view `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns an internal [`AppError`] if the view is missing or fails to
    /// render.
    pub fn render(&self, name: &str, context: impl Serialize) -> Result<Html<String>, AppError> {
        let template = self
            .env
            .get_template(&file_name(name))
            .map_err(|e| render_error(name, e))?;
        template
            .render(context)
            .map(Html)
            .map_err(|e| render_error(name, e))
    }

    /// Render a page: the flash locals overlaid with page-specific fields.
    ///
    /// Page fields win over flash locals of the same name.
    ///
    /// # Errors
    ///
    /// Same as [`Views::render`], plus failure to serialize `page`.
    pub fn render_page(
        &self,
        name: &str,
        locals: &FlashMessages,
        page: impl Serialize,
    ) -> Result<Html<String>, AppError> {
        let mut context = serde_json::to_value(locals)
            .map_err(|e| AppError::internal("Failed to render page").with_source(e.into()))?;
        let page = serde_json::to_value(page)
            .map_err(|e| AppError::internal("Failed to render page").with_source(e.into()))?;

        if let (Value::Object(context), Value::Object(page)) = (&mut context, page) {
            context.extend(page);
        }

        self.render(name, &context)
    }
}

fn file_name(name: &str) -> String {
    format!("{name}.{VIEW_EXTENSION}")
}

fn render_error(name: &str, err: minijinja::Error) -> AppError {
    AppError::internal("Failed to render page")
        .with_source(anyhow::Error::new(err).context(format!("view `{name}`")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_session::FlashKind;

    fn views() -> Views {
        Views::from_templates([
            ("greeting", "Hello {{ name }}"),
            (
                "page",
                "{{ title }}|{% for m in success %}{{ m }}{% endfor %}|{{ error }}",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_appends_extension() {
        let Html(body) = views().render("greeting", json!({ "name": "shopper" })).unwrap();
        assert_eq!(body, "Hello shopper");
    }

    #[test]
    fn test_missing_view_is_internal_error() {
        let err = views().render("nope", json!({})).unwrap_err();
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn test_page_fields_override_locals() {
        let mut locals = FlashMessages::default();
        locals.push(FlashKind::Success, "Saved");
        locals.push(FlashKind::Error, "hidden");

        let Html(body) = views()
            .render_page("page", &locals, json!({ "title": "Home", "error": "Page not found" }))
            .unwrap();

        assert_eq!(body, "Home|Saved|Page not found");
    }

    #[test]
    fn test_from_dir_rejects_missing_directory() {
        let result = Views::from_dir("/definitely/not/a/views/dir");
        assert!(matches!(result, Err(StartupError::Views { .. })));
    }

    #[test]
    fn test_from_dir_loads_bundled_views() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("views");
        let views = Views::from_dir(dir).unwrap();
        let Html(body) = views
            .render_page(
                "404",
                &FlashMessages::default(),
                json!({ "title": "Page Not Found", "error": "Page not found", "loggedin": false, "cartCount": 0 }),
            )
            .unwrap();
        assert!(body.contains("Page not found"));
    }
}
