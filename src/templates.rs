use std::sync::OnceLock;
use tera::Tera;

static TERA: OnceLock<Tera> = OnceLock::new();

/// Lazily compiled template set. A broken or missing templates directory
/// degrades to an empty set rather than refusing to start, since the JSON
/// API does not depend on it.
pub fn get_tera() -> &'static Tera {
    TERA.get_or_init(|| match Tera::new("templates/**/*.html") {
        Ok(tera) => tera,
        Err(e) => {
            tracing::warn!("failed to load templates: {}", e);
            Tera::default()
        }
    })
}
