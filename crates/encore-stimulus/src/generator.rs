//! Generation of the controller table module.

use indexmap::IndexMap;
use tracing::debug;

use crate::capabilities::Capabilities;
use crate::error::{Result, StimulusError};
use crate::manifest::{ControllerManifest, FetchMode};
use crate::package::PackageLocator;

/// One enabled package controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSpec {
    pub identifier: String,
    /// Module specifier imported by the table, `<package>/<main>`.
    pub import_path: String,
    pub lazy: bool,
}

/// Enabled package controllers keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerTable {
    specs: IndexMap<String, ControllerSpec>,
}

impl ControllerTable {
    pub fn insert(&mut self, spec: ControllerSpec) {
        self.specs.insert(spec.identifier.clone(), spec);
    }

    pub fn get(&self, identifier: &str) -> Option<&ControllerSpec> {
        self.specs.get(identifier)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ControllerSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The table as a JavaScript object literal.
    ///
    /// ```
    /// use encore_stimulus::{ControllerSpec, ControllerTable};
    ///
    /// let mut table = ControllerTable::default();
    /// assert_eq!(table.to_expression(), "{}");
    ///
    /// table.insert(ControllerSpec {
    ///     identifier: "symfony--ux-chartjs--chart".into(),
    ///     import_path: "@symfony/ux-chartjs/dist/controller.js".into(),
    ///     lazy: true,
    /// });
    /// assert_eq!(
    ///     table.to_expression(),
    ///     r#"{ "symfony--ux-chartjs--chart": [() => import("@symfony/ux-chartjs/dist/controller.js"), true] }"#
    /// );
    /// ```
    pub fn to_expression(&self) -> String {
        if self.specs.is_empty() {
            return "{}".to_string();
        }
        let entries: Vec<String> = self
            .specs
            .values()
            .map(|spec| {
                format!(
                    "\"{}\": [() => import(\"{}\"), {}]",
                    escape(&spec.identifier),
                    escape(&spec.import_path),
                    spec.lazy
                )
            })
            .collect();
        format!("{{ {} }}", entries.join(", "))
    }

    /// The table as an ES module with a default export.
    pub fn to_module(&self) -> String {
        format!("export default {};", self.to_expression())
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Resolves every controller of the manifest against its package descriptor.
///
/// Disabled controllers are skipped. The user's `enabled` and `fetch`
/// settings override the package's.
pub fn generate_controller_table(
    manifest: &ControllerManifest,
    locator: &dyn PackageLocator,
    capabilities: &Capabilities,
) -> Result<ControllerTable> {
    capabilities.require_all()?;

    let mut table = ControllerTable::default();
    for (package, controllers) in &manifest.controllers {
        let descriptors = locator.controllers(package)?;

        for (controller, user) in controllers {
            let descriptor =
                descriptors
                    .get(controller)
                    .ok_or_else(|| StimulusError::MissingController {
                        package: package.clone(),
                        controller: controller.clone(),
                    })?;

            if !user.enabled.unwrap_or(descriptor.enabled) {
                debug!(package = %package, controller = %controller, "controller disabled");
                continue;
            }

            let identifier = descriptor
                .name
                .clone()
                .or_else(|| user.name.clone())
                .unwrap_or_else(|| default_identifier(package, controller))
                .replace('/', "--");
            let lazy = user.effective_fetch(descriptor.fetch) == FetchMode::Lazy;

            table.insert(ControllerSpec {
                identifier,
                import_path: format!("{package}/{}", descriptor.main),
                lazy,
            });
        }
    }

    debug!(controllers = table.len(), "generated controller table");
    Ok(table)
}

/// `@scope/package` + `controller` gives `scope/package/controller` with
/// underscores turned into dashes.
fn default_identifier(package: &str, controller: &str) -> String {
    let joined = format!("{package}/{controller}");
    let mut chars = joined.chars();
    chars.next();
    chars.as_str().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_separates_and_escapes_entries() {
        let mut table = ControllerTable::default();
        table.insert(ControllerSpec {
            identifier: "acme--upload".into(),
            import_path: "@acme/upload/dist/controller.js".into(),
            lazy: false,
        });
        table.insert(ControllerSpec {
            identifier: "acme--quote\"d".into(),
            import_path: "@acme/quote\\d/controller.js".into(),
            lazy: true,
        });

        assert_eq!(
            table.to_expression(),
            r#"{ "acme--upload": [() => import("@acme/upload/dist/controller.js"), false], "acme--quote\"d": [() => import("@acme/quote\\d/controller.js"), true] }"#
        );
        assert_eq!(
            table.to_module(),
            format!("export default {};", table.to_expression())
        );
    }
}
