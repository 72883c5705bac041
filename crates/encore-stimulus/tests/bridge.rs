//! Tests for the runtime controller bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use encore_stimulus::{
    Activation, Application, BridgeError, BridgeOptions, ContextEntry, ControllerSpec,
    ExternalController, ImportError, Importer, LoaderKind, importer, start_app,
};

type Ctor = &'static str;

/// An importer resolving to `name` that counts its invocations.
fn counting_importer(name: Ctor, count: &Arc<AtomicUsize>) -> Importer<Ctor> {
    let count = Arc::clone(count);
    importer(move || {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, ImportError>(name)
        }
    })
}

fn failing_importer() -> Importer<Ctor> {
    importer(|| async { Err::<Ctor, ImportError>("network error".into()) })
}

#[tokio::test]
async fn test_concurrent_activations_import_once() {
    let imports = Arc::new(AtomicUsize::new(0));
    let app = Application::new(false);
    app.register_lazy("chart", counting_importer("Chart", &imports));

    let (first, second) = tokio::join!(app.activate("chart"), app.activate("chart"));

    assert_eq!(imports.load(Ordering::SeqCst), 1);
    let outcomes = [first.unwrap(), second.unwrap()];
    assert!(outcomes.iter().any(|o| matches!(o, Activation::Resolved("Chart"))));
    assert!(outcomes.iter().any(|o| matches!(o, Activation::AlreadyResolving)));

    assert!(matches!(app.activate("chart").await.unwrap(), Activation::Ready("Chart")));
    assert_eq!(app.constructor("chart"), Some("Chart"));
    assert_eq!(app.loader_kind("chart"), Some(LoaderKind::Lazy));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_threads_share_one_import() {
    let imports = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&imports);
    let slow = importer(move || {
        let count = Arc::clone(&count);
        async move {
            count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ImportError>("Modal")
        }
    });

    let app = Application::new(false);
    app.register_lazy("modal", slow);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.activate("modal").await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(imports.load(Ordering::SeqCst), 1);
    assert_eq!(app.constructor("modal"), Some("Modal"));
}

#[tokio::test]
async fn test_unknown_identifier_is_an_error() {
    let app: Application<Ctor> = Application::new(false);
    let err = app.activate("missing").await.unwrap_err();
    assert_eq!(
        err,
        BridgeError::Unregistered {
            identifier: "missing".into()
        }
    );
}

#[tokio::test]
async fn test_failed_import_keeps_placeholder() {
    let app = Application::new(false);
    app.register_lazy("broken", failing_importer());

    let outcome = app.activate("broken").await.unwrap();
    assert!(matches!(
        outcome,
        Activation::Failed(BridgeError::LoadFailed { ref message, .. }) if message == "network error"
    ));
    assert!(app.is_pending("broken"));

    // The guard is released, so a later activation tries again.
    assert!(matches!(app.activate("broken").await.unwrap(), Activation::Failed(_)));
}

#[tokio::test]
async fn test_context_entries_follow_their_policy() {
    let imports = Arc::new(AtomicUsize::new(0));
    let context = vec![
        (
            "./controllers/hello_controller.js".to_string(),
            ContextEntry::Constructor("Hello"),
        ),
        (
            "./controllers/admin/user_list_controller.js".to_string(),
            ContextEntry::Deferred(counting_importer("UserList", &imports)),
        ),
        (
            "./controllers/search_lazy_controller.js".to_string(),
            ContextEntry::Deferred(counting_importer("Search", &imports)),
        ),
    ];
    let options = BridgeOptions::default()
        .with_should_eager_load(|path, _identifier| !path.ends_with("_lazy_controller.js"));

    let app = start_app(context, options, Vec::new()).unwrap();
    app.settled().await;

    assert_eq!(app.constructor("hello"), Some("Hello"));
    assert_eq!(app.loader_kind("hello"), Some(LoaderKind::Eager));
    assert_eq!(app.constructor("admin--user-list"), Some("UserList"));
    assert!(app.is_pending("search-lazy"));
    assert_eq!(imports.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_normalizer_replaces_the_default() {
    let context = vec![("Hello_Controller.js".to_string(), ContextEntry::Constructor("Hello"))];
    let options = BridgeOptions::default()
        .with_debug(true)
        .with_normalizer(|path| path.trim_end_matches(".js").to_string());

    let app = start_app(context, options, Vec::new()).unwrap();
    assert!(app.is_debug());
    assert_eq!(app.identifiers(), ["Hello_Controller"]);
}

#[tokio::test]
async fn test_external_controllers_keep_their_identifiers() {
    let imports = Arc::new(AtomicUsize::new(0));
    let specs = [
        ControllerSpec {
            identifier: "symfony--ux-chartjs--chart".into(),
            import_path: "@symfony/ux-chartjs/dist/controller.js".into(),
            lazy: true,
        },
        ControllerSpec {
            identifier: "symfony--ux-dropzone--dropzone".into(),
            import_path: "@symfony/ux-dropzone/dist/controller.js".into(),
            lazy: false,
        },
    ];
    let external = ExternalController::from_specs(&specs, |spec| {
        let name: Ctor = if spec.lazy { "Chart" } else { "Dropzone" };
        counting_importer(name, &imports)
    });

    let app = start_app(Vec::new(), BridgeOptions::default(), external).unwrap();
    app.settled().await;

    assert!(app.is_pending("symfony--ux-chartjs--chart"));
    assert_eq!(app.loader_kind("symfony--ux-chartjs--chart"), Some(LoaderKind::External));
    assert_eq!(app.constructor("symfony--ux-dropzone--dropzone"), Some("Dropzone"));
    assert_eq!(imports.load(Ordering::SeqCst), 1);

    assert!(matches!(
        app.activate("symfony--ux-chartjs--chart").await.unwrap(),
        Activation::Resolved("Chart")
    ));
    assert_eq!(app.loader_kind("symfony--ux-chartjs--chart"), Some(LoaderKind::External));
}

#[tokio::test]
async fn test_eager_registration_replaces_pending_placeholder() {
    let imports = Arc::new(AtomicUsize::new(0));
    let app = Application::new(false);
    app.register_lazy("tabs", counting_importer("LazyTabs", &imports));
    app.register("tabs", "Tabs");

    assert!(matches!(app.activate("tabs").await.unwrap(), Activation::Ready("Tabs")));
    assert_eq!(imports.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_replaced_placeholder_reports_the_registered_constructor() {
    let app = Application::new(false);
    let registry = app.clone();
    app.register_lazy(
        "tabs",
        importer(move || {
            let registry = registry.clone();
            async move {
                registry.register("tabs", "Other");
                Ok::<_, ImportError>("LazyTabs")
            }
        }),
    );

    let outcome = app.activate("tabs").await.unwrap();
    assert!(matches!(outcome, Activation::Ready("Other")));
    assert_eq!(app.constructor("tabs"), Some("Other"));
}

#[test]
fn test_start_app_without_runtime_is_an_error() {
    let imports = Arc::new(AtomicUsize::new(0));
    let external = vec![ExternalController {
        identifier: "symfony--ux-dropzone--dropzone".to_string(),
        lazy: false,
        importer: counting_importer("Dropzone", &imports),
    }];

    let err = start_app(Vec::new(), BridgeOptions::default(), external)
        .err()
        .unwrap();
    assert_eq!(
        err,
        BridgeError::NoRuntime {
            identifier: "symfony--ux-dropzone--dropzone".into()
        }
    );
    assert_eq!(imports.load(Ordering::SeqCst), 0);
}

#[test]
fn test_start_app_without_runtime_registers_lazy_entries() {
    let imports = Arc::new(AtomicUsize::new(0));
    let context = vec![
        ("./controllers/hello_controller.js".to_string(), ContextEntry::Constructor("Hello")),
        (
            "./controllers/search_controller.js".to_string(),
            ContextEntry::Deferred(counting_importer("Search", &imports)),
        ),
    ];

    let app = start_app(context, BridgeOptions::default(), Vec::new()).unwrap();
    assert_eq!(app.constructor("hello"), Some("Hello"));
    assert!(app.is_pending("search"));
    assert_eq!(imports.load(Ordering::SeqCst), 0);
}
