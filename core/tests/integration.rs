//! Monitor lifecycle tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Reconciler` and
//! `SyntheticsClient` over real HTTP through `UreqTransport`. Covers the
//! create / read / update / delete flow, script provisioning, and the
//! not-found paths that only show up against a real server.

use synthetics_core::{
    ApiError, ChangedFields, ClientConfig, Fingerprinter, Frequency, MonitorSpec, MonitorStatus,
    MonitorType, ReconcileError, Reconciler, ScriptLocation, ScriptState, Sha256Fingerprinter,
    SyntheticsClient, UreqTransport,
};

/// Start the mock server on a random port and return its API root.
fn start_mock_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/synthetics/api/v3")
}

fn reconciler(base_url: &str) -> Reconciler<UreqTransport> {
    let config = ClientConfig::new("test-key").unwrap().with_base_url(base_url);
    Reconciler::new(SyntheticsClient::new(config, UreqTransport::new()).unwrap())
}

fn simple_spec(name: &str) -> MonitorSpec {
    MonitorSpec::new(
        name,
        MonitorType::Simple,
        Frequency::FiveMinutes,
        "https://example.com",
        vec!["AWS_US_EAST_1".to_string()],
        MonitorStatus::Enabled,
        7.0,
    )
}

#[test]
fn monitor_lifecycle() {
    let base_url = start_mock_server();
    let reconciler = reconciler(&base_url);

    // Step 1: create a plain monitor; no script, so no script call.
    let spec = simple_spec("home page");
    let created = reconciler.create(&spec).unwrap();
    assert!(!created.id.is_empty());
    assert!(created.matches_required(&spec));
    assert!(created.script.is_none());
    let id = created.id.clone();

    // Step 2: read it back.
    let read = reconciler.read(&id).unwrap();
    assert_eq!(read.id, id);
    assert_eq!(read.name, "home page");
    assert_eq!(read.frequency, Frequency::FiveMinutes);
    assert!(read.script.is_none());
    assert_eq!(read.script_locations, Some(Vec::new()));
    assert!(reconciler.exists(&id).unwrap());

    // Step 3: update required fields and one option; type stays put.
    let mut desired = spec.clone();
    desired.sla_threshold = 9.5;
    desired.status = MonitorStatus::Muted;
    desired.verify_ssl = Some(false);
    let changes = ChangedFields::between(&spec, &desired);
    let updated = reconciler.update(&id, &desired, &changes).unwrap();
    assert_eq!(updated.sla_threshold, 9.5);
    assert_eq!(updated.status, MonitorStatus::Muted);
    assert_eq!(updated.verify_ssl, Some(false));
    assert_eq!(updated.monitor_type, MonitorType::Simple);

    // Step 4: list sees exactly this monitor.
    let page = reconciler.client().list_monitors(0, 10).unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.monitors[0].id, id);

    // Step 5: delete, then the monitor is gone.
    reconciler.delete(&id).unwrap();
    assert!(!reconciler.exists(&id).unwrap());
    let err = reconciler.read(&id).unwrap_err();
    assert!(err.is_not_found());

    // Step 6: deleting again surfaces the server's 404.
    let err = reconciler.delete(&id).unwrap_err();
    match err {
        ReconcileError::Api { source, .. } => assert_eq!(source.status(), Some(404)),
        other => panic!("expected api error, got {other:?}"),
    }
}

#[test]
fn scripted_monitor_lifecycle() {
    let base_url = start_mock_server();
    let reconciler = reconciler(&base_url);
    let fingerprinter = Sha256Fingerprinter;

    let mut spec = simple_spec("checkout flow");
    spec.monitor_type = MonitorType::ScriptBrowser;
    spec.script = Some("console.log('v1')".to_string());
    spec.script_locations = vec![ScriptLocation {
        name: "private-1".to_string(),
        hmac: "c2VjcmV0".to_string(),
    }];

    // Create attaches the script and records its fingerprint.
    let created = reconciler.create(&spec).unwrap();
    let v1 = fingerprinter.fingerprint("console.log('v1')");
    assert_eq!(created.script.as_ref(), Some(&v1));
    assert_eq!(created.script_locations.as_deref(), Some(spec.script_locations.as_slice()));

    // Read observes the fingerprint; locations are not returned by the API.
    let read = reconciler.read(&created.id).unwrap();
    assert_eq!(read.script.as_ref(), Some(&v1));
    assert_eq!(read.script_locations, None);

    // Changing only the script re-uploads it.
    let mut desired = spec.clone();
    desired.script = Some("console.log('v2')".to_string());
    let changes = ChangedFields::between(&spec, &desired);
    let updated = reconciler.update(&created.id, &desired, &changes).unwrap();
    let v2 = fingerprinter.fingerprint("console.log('v2')");
    assert_eq!(updated.script.as_ref(), Some(&v2));

    match reconciler.client().get_script(&created.id).unwrap() {
        ScriptState::Present(fingerprint) => assert_eq!(fingerprint, v2),
        ScriptState::NotFound => panic!("script should be present"),
    }

    // An update with no optional changes leaves the script alone.
    let unchanged = reconciler
        .update(&created.id, &desired, &ChangedFields::none())
        .unwrap();
    assert_eq!(unchanged.script.as_ref(), Some(&v2));

    // Dropping the script from the spec detaches it remotely.
    let mut without_script = desired.clone();
    without_script.script = None;
    let changes = ChangedFields::between(&desired, &without_script);
    let detached = reconciler
        .update(&created.id, &without_script, &changes)
        .unwrap();
    assert!(detached.script.is_none());
    let read = reconciler.read(&created.id).unwrap();
    assert!(read.script.is_none());
    assert_eq!(read.script_locations, Some(Vec::new()));

    reconciler.delete(&created.id).unwrap();
    let err = reconciler.client().get_script(&created.id);
    assert!(matches!(err, Ok(ScriptState::NotFound)));
}

#[test]
fn list_pages_through_monitors() {
    let base_url = start_mock_server();
    let reconciler = reconciler(&base_url);

    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(reconciler.create(&simple_spec(&format!("m{i}"))).unwrap().id);
    }

    let first = reconciler.client().list_monitors(0, 2).unwrap();
    assert_eq!(first.count, 3);
    assert_eq!(first.monitors.len(), 2);
    assert_eq!(first.monitors[0].id, ids[0]);

    let rest = reconciler.client().list_monitors(2, 2).unwrap();
    assert_eq!(rest.monitors.len(), 1);
    assert_eq!(rest.monitors[0].id, ids[2]);

    // Zero offset and limit fall back to the server's defaults.
    let all = reconciler.client().list_monitors(0, 0).unwrap();
    assert_eq!(all.monitors.len(), 3);
}

#[test]
fn empty_locations_never_reach_server() {
    let base_url = start_mock_server();
    let reconciler = reconciler(&base_url);

    let spec = simple_spec("no locations");
    let created = reconciler.create(&spec).unwrap();

    let mut desired = spec.clone();
    desired.locations.clear();
    let err = reconciler
        .update(&created.id, &desired, &ChangedFields::none())
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidSpec(_)));
}

#[test]
fn wrong_key_is_a_remote_error() {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_key(listener, Some("server-key".to_string())).await
        })
        .unwrap();
    });

    let reconciler = reconciler(&format!("http://{addr}/synthetics/api/v3"));
    let err = reconciler.exists("anything").unwrap_err();
    match err.api_error() {
        Some(ApiError::RemoteError { status, .. }) => assert_eq!(*status, 401),
        other => panic!("expected 401, got {other:?}"),
    }
}
