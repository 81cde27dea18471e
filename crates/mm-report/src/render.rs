//! Template loading and rendering.

use crate::context::ReportContext;
use crate::error::{ReportError, Result};
use minijinja::context;
use std::path::Path;
use tracing::info;

/// Renders HTML reports and subject lines for one invocation.
pub struct Renderer {
    context: ReportContext,
}

impl Renderer {
    pub fn new(context: ReportContext) -> Self {
        Renderer { context }
    }

    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    /// Read the template source from `path` and render it to HTML.
    ///
    /// The source is re-read on every call so the dev server picks up edits
    /// between refreshes. Query functions evaluated by the template issue
    /// their HTTP requests here; any failure aborts the render.
    pub fn render_file(&self, path: &Path) -> Result<String> {
        let source =
            std::fs::read_to_string(path).map_err(|e| ReportError::TemplateNotFound {
                path: path.display().to_string(),
                source: e,
            })?;

        let mut env = self.context.environment();
        env.add_template_owned("report", source)?;
        let html = env.get_template("report")?.render(context! {})?;

        info!(bytes = html.len(), template = %path.display(), "report rendered");
        Ok(html)
    }

    /// Render an email subject format string. Only the time globals
    /// (`date`, `time_selection`, ...) are available; no queries run.
    pub fn render_subject(&self, template: &str) -> Result<String> {
        let env = self.context.subject_environment();
        Ok(env.render_str(template, context! {})?)
    }
}
