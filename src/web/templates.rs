use axum::response::Html;
use rust_embed::RustEmbed;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::web::error::AppError;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

/// HTML templates compiled once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn load() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        // Names carry no extension, so escape everything.
        tera.autoescape_on(vec![""]);
        for path in TemplateAssets::iter() {
            let Some(file) = TemplateAssets::get(&path) else {
                continue;
            };
            let source = String::from_utf8_lossy(&file.data);
            let path: &str = path.as_ref();
            // `list.html` is registered as `list`.
            let name = path.strip_suffix(".html").unwrap_or(path);
            tera.add_raw_template(name, &source)?;
            debug!(template = name, "Registered HTML template.");
        }
        Ok(Self { tera })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, AppError> {
        let context = Context::from_serialize(data)?;
        Ok(Html(self.tera.render(name, &context)?))
    }
}
