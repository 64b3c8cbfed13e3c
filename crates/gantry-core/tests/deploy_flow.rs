//! End-to-end flow tests: options in, commands out, responses parsed.

use std::io::Write;

use gantry_core::prelude::*;

fn canned_deploy_response(url: &str) -> String {
    format!(
        r#"{{"kind": "Service", "metadata": {{"name": "app"}}, "status": {{"url": "{url}", "traffic": [{{"revisionName": "app-v2", "tag": "canary", "url": "https://canary---app.example"}}]}}}}"#
    )
}

#[test]
fn deploy_with_traffic_runs_two_commands_and_yields_the_tagged_url() {
    let mut request = DeploymentRequest::new(Target::Service("app".into()));
    request.image_source = Some(ImageSource::Image("gcr.io/acme/app:1".into()));
    request.traffic = Some(TrafficSpec::ToRevisions(
        [("app-v2", "100")].into_iter().collect(),
    ));
    request.regions = vec!["europe-west1".into()];
    request.skip_default_labels = true;

    let plan = build_plan(&request, &FileMetadataReader).unwrap();
    assert_eq!(plan.commands.len(), 2);
    assert_eq!(plan.commands[0].shape, ResponseShape::ServiceOrJobDescriptor);
    assert_eq!(plan.commands[1].shape, ResponseShape::TrafficAssignmentList);

    // First command: the deploy, parsed as a resource descriptor.
    let deploy = parse_response(
        plan.commands[0].shape,
        &canned_deploy_response("https://app.example"),
        None,
    )
    .unwrap();
    assert_eq!(deploy.url.as_deref(), Some("https://app.example"));

    // Second command: the traffic update, parsed as an assignment list.
    let traffic = parse_response(
        plan.commands[1].shape,
        r#"[{"serviceUrl": "https://app.example", "urls": ["https://canary---app.example"]}]"#,
        None,
    )
    .unwrap();
    assert_eq!(
        traffic.url.as_deref(),
        Some("https://canary---app.example")
    );
}

#[test]
fn metadata_file_flow_reads_kind_and_name_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"apiVersion: serving.knative.dev/v1\nkind: Service\nmetadata:\n  name: app\n")
        .unwrap();

    let request = DeploymentRequest::new(Target::MetadataFile {
        path: path.clone(),
        explicit_name: Some("app".into()),
    });

    let plan = build_plan(&request, &FileMetadataReader).unwrap();
    assert_eq!(plan.commands.len(), 1);
    assert_eq!(
        &plan.commands[0].args[..3],
        &["run", "services", "replace"]
    );
    assert_eq!(plan.commands[0].args[3], path.display().to_string());
}

#[test]
fn empty_responses_yield_no_url_without_failing() {
    for shape in [
        ResponseShape::ServiceOrJobDescriptor,
        ResponseShape::TrafficAssignmentList,
    ] {
        let result = parse_response(shape, "{}", None).unwrap();
        assert_eq!(result.url, None);
    }
}
