//! Default controller identifier normalization.

use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\w+$").expect("valid extension regex"));
static CONTROLLERS_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*/controllers/").expect("valid controllers dir regex"));
static CONTROLLER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_controller$").expect("valid controller suffix regex"));

/// Turns a controller module path into a Stimulus identifier.
///
/// ```
/// use encore_stimulus::normalize_identifier;
///
/// assert_eq!(
///     normalize_identifier("assets/controllers/hello_world_controller.js"),
///     "hello-world"
/// );
/// ```
pub fn normalize_identifier(path: &str) -> String {
    let identifier = EXTENSION.replace(path, "");
    let identifier = CONTROLLERS_DIR.replace(&identifier, "");
    let identifier = CONTROLLER_SUFFIX.replace(&identifier, "");
    identifier
        .replace('/', "--")
        .replace('_', "-")
        .to_lowercase()
}
