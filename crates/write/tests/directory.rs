use crossbuild_compose::CompositionWriter;
use crossbuild_core::{Composition, CompositionSpec, TypeReference};
use crossbuild_write::{to_yaml, DirectoryWriter};

fn doc(name: &str) -> Composition {
    Composition::new(
        name,
        CompositionSpec {
            composite_type_ref: TypeReference { api_version: "example.org/v1".into(), kind: "XThing".into() },
            resources: vec![],
            write_connection_secrets_to_namespace: Some("crossplane-system".into()),
            publish_connection_details_with_store_config_ref: None,
        },
    )
}

#[test]
fn files_are_named_after_documents() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("nested").join("out");
    let mut w = DirectoryWriter::new(&out);
    w.write(&doc("alpha")).unwrap();
    w.write(&doc("beta")).unwrap();

    let mut names: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["alpha.yaml", "beta.yaml"]);

    let written = std::fs::read_to_string(out.join("alpha.yaml")).unwrap();
    assert_eq!(written, to_yaml(&doc("alpha")).unwrap());
    assert!(!written.starts_with("---"));
}

#[test]
fn rewriting_replaces_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let mut w = DirectoryWriter::new(tmp.path());
    w.write(&doc("alpha")).unwrap();
    let mut changed = doc("alpha");
    changed.spec.write_connection_secrets_to_namespace = None;
    w.write(&changed).unwrap();
    let written = std::fs::read_to_string(w.path_for("alpha")).unwrap();
    assert!(!written.contains("crossplane-system"));
}

#[test]
fn written_yaml_parses_back() {
    let tmp = tempfile::tempdir().unwrap();
    let mut w = DirectoryWriter::new(tmp.path());
    w.write(&doc("gamma")).unwrap();
    let text = std::fs::read_to_string(w.path_for("gamma")).unwrap();
    let value: serde_json::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(value["apiVersion"], "apiextensions.crossplane.io/v1");
    assert_eq!(value["spec"]["compositeTypeRef"]["kind"], "XThing");
}
