//! The controller bridge through the `config` and `transform` phases.

use std::fs;
use std::path::Path;

use encore_plugin::{EncorePlugin, Error, HostConfig, InputOption};
use serde_json::{Value, json};
use tempfile::TempDir;

fn install(root: &Path, package: &str, package_json: Value) {
    let dir = root.join("node_modules").join(package);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.json"), package_json.to_string()).unwrap();
}

fn write_controllers(root: &Path, path: &str, manifest: Value) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, manifest.to_string()).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    install(dir.path(), "@hotwired/stimulus", json!({}));
    install(dir.path(), "@symfony/stimulus-bridge", json!({}));
    install(
        dir.path(),
        "@symfony/ux-chartjs",
        json!({
            "symfony": { "controllers": {
                "chart": { "main": "dist/controller.js", "enabled": true, "fetch": "lazy" }
            } }
        }),
    );
    dir
}

fn host(root: &Path) -> HostConfig {
    HostConfig {
        root: root.to_path_buf(),
        ..HostConfig::default()
    }
}

#[test]
fn test_controller_manifest_drives_table_and_inputs() {
    let dir = project();
    write_controllers(
        dir.path(),
        "assets/controllers.json",
        json!({
            "controllers": { "@symfony/ux-chartjs": { "chart": {} } },
            "entrypoints": ["assets/admin.js"]
        }),
    );
    let mut plugin = EncorePlugin::new(&json!({ "enableStimulusBridge": true })).unwrap();

    let patch = plugin.config(&host(dir.path())).unwrap().unwrap();

    assert_eq!(
        patch.aliases.get("@symfony/stimulus-bridge").map(String::as_str),
        Some("vite-encore-plugin/stimulus-bridge")
    );
    assert_eq!(patch.input, Some(InputOption::List(vec!["assets/admin.js".into()])));

    let expected = r#"{ "symfony--ux-chartjs--chart": [() => import("@symfony/ux-chartjs/dist/controller.js"), true] }"#;
    assert_eq!(plugin.controllers_code(), Some(expected));

    let runtime = "const controllers = __VITE_ENCORE_PLUGIN_UX_CONTROLLERS__; // __VITE_ENCORE_PLUGIN_UX_CONTROLLERS__";
    assert_eq!(
        plugin.transform(runtime).unwrap(),
        format!("const controllers = {expected}; // __VITE_ENCORE_PLUGIN_UX_CONTROLLERS__")
    );
    assert_eq!(plugin.transform("export default {};"), None);
}

#[test]
fn test_missing_default_manifest_degrades_to_empty_table() {
    let dir = project();
    let mut plugin = EncorePlugin::new(&json!({ "enableStimulusBridge": true })).unwrap();

    let patch = plugin.config(&host(dir.path())).unwrap().unwrap();

    assert_eq!(patch.input, None);
    assert_eq!(patch.aliases.len(), 1);
    assert_eq!(plugin.controllers_code(), Some("{}"));
    assert_eq!(
        plugin.transform("start(__VITE_ENCORE_PLUGIN_UX_CONTROLLERS__)").as_deref(),
        Some("start({})")
    );
}

#[test]
fn test_missing_explicit_manifest_is_fatal() {
    let dir = project();
    let mut plugin = EncorePlugin::new(&json!({
        "enableStimulusBridge": { "enabled": true, "controllerJsonPath": "config/controllers.json" }
    }))
    .unwrap();

    let err = plugin.config(&host(dir.path())).unwrap_err();
    assert!(
        matches!(err, Error::MissingResource { ref resource, .. } if resource.ends_with("controllers.json"))
    );
}

#[test]
fn test_missing_runtime_package_is_a_missing_dependency() {
    let dir = TempDir::new().unwrap();
    install(dir.path(), "@hotwired/stimulus", json!({}));
    write_controllers(dir.path(), "assets/controllers.json", json!({ "controllers": {} }));
    let mut plugin = EncorePlugin::new(&json!({ "enableStimulusBridge": true })).unwrap();

    let err = plugin.config(&host(dir.path())).unwrap_err();
    match err {
        Error::MissingDependency { package, hint } => {
            assert_eq!(package, "@symfony/stimulus-bridge");
            assert_eq!(hint, "npm i @symfony/stimulus-bridge");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_malformed_controller_manifest_names_the_field() {
    let dir = project();
    write_controllers(
        dir.path(),
        "assets/controllers.json",
        json!({ "controllers": { "@symfony/ux-chartjs": { "chart": { "fetch": "later" } } } }),
    );
    let mut plugin = EncorePlugin::new(&json!({ "enableStimulusBridge": true })).unwrap();

    let err = plugin.config(&host(dir.path())).unwrap_err();
    assert!(matches!(
        err,
        Error::ControllerManifest { ref field, .. } if field == "controllers.@symfony/ux-chartjs.chart.fetch"
    ));
}
