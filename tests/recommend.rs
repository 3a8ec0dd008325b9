//! Recommendation lifecycle tests against on-disk projects

mod helper;

use serde_json::json;
use tempfile::TempDir;

use helper::{MockRegistry, load_recommender, publish_ivy, write_config, write_file};
use version_recommender::publish::patch_ivy;
use version_recommender::recommend::error::RecommendError;
use version_recommender::recommend::override_state::OverrideState;
use version_recommender::recommend::repository::LocalRepository;
use version_recommender::recommend::update::{UpdateEngine, UpdateOutcome};

fn publish_platform(project: &TempDir) {
    let repo = project.path().join("repository");
    publish_ivy(
        &repo,
        "com.acme",
        "platform",
        "1.0",
        &[("g", "a", "1"), ("g", "c", "1")],
    );
    publish_ivy(&repo, "g", "a", "1", &[("g", "b", "1.0")]);
    publish_ivy(&repo, "g", "c", "1", &[("g", "b", "2.0")]);
    publish_ivy(&repo, "g", "b", "1.0", &[("g", "d", "1.0")]);
    publish_ivy(&repo, "g", "b", "2.0", &[("g", "d", "2.0")]);
}

#[test]
fn transitive_provider_keeps_shallowest_first_declared_version() {
    let project = TempDir::new().unwrap();
    publish_platform(&project);
    write_config(
        &project,
        json!({
            "providers": [{
                "name": "platform", "kind": "ivy",
                "module": "com.acme:platform:1.0", "transitive": true
            }]
        }),
    );

    let recommender = load_recommender(&project);

    assert_eq!(recommender.lookup("g", "a").unwrap(), "1");
    assert_eq!(recommender.lookup("g", "b").unwrap(), "1.0");
    assert_eq!(recommender.lookup("g", "d").unwrap(), "1.0");
    assert_eq!(recommender.lookup("com.acme", "platform").unwrap(), "1.0");
}

#[test]
fn non_transitive_provider_only_reads_declared_dependencies() {
    let project = TempDir::new().unwrap();
    publish_platform(&project);
    write_config(
        &project,
        json!({
            "providers": [{ "name": "platform", "kind": "ivy", "module": "com.acme:platform:1.0" }]
        }),
    );

    let recommender = load_recommender(&project);

    assert_eq!(recommender.lookup("g", "a").unwrap(), "1");
    assert!(matches!(
        recommender.lookup("g", "b"),
        Err(RecommendError::NoVersion { .. })
    ));
}

#[test]
fn providers_are_consulted_in_declaration_order() {
    let project = TempDir::new().unwrap();
    write_file(
        &project,
        "bom.xml",
        r#"<project>
  <properties><b.version>2.1</b.version></properties>
  <dependencyManagement>
    <dependencies>
      <dependency><groupId>g</groupId><artifactId>a</artifactId><version>2.0</version></dependency>
      <dependency><groupId>g</groupId><artifactId>b</artifactId><version>${b.version}</version></dependency>
    </dependencies>
  </dependencyManagement>
</project>"#,
    );
    write_config(
        &project,
        json!({
            "providers": [
                { "name": "pins", "kind": "properties", "entries": { "g:a": "1.0", "h:*": "3.0" } },
                { "name": "bom", "kind": "bom", "file": "bom.xml" }
            ]
        }),
    );

    let recommender = load_recommender(&project);

    assert_eq!(recommender.lookup("g", "a").unwrap(), "1.0");
    assert_eq!(recommender.lookup("g", "b").unwrap(), "2.1");
    assert_eq!(recommender.lookup("h", "anything").unwrap(), "3.0");
    assert!(matches!(
        recommender.lookup("z", "z"),
        Err(RecommendError::NoVersion { .. })
    ));
}

#[test]
fn stored_version_survives_new_instance_and_reset() {
    let project = TempDir::new().unwrap();
    write_config(
        &project,
        json!({
            "providers": [{ "name": "pins", "kind": "properties", "entries": { "g:a": "1.0" } }]
        }),
    );

    let mut recommender = load_recommender(&project);
    recommender.set("pins", Some("9.0")).unwrap();
    let stored = recommender.store("pins").unwrap();

    assert_eq!(stored, project.path().join(".pins.version"));
    assert_eq!(std::fs::read_to_string(&stored).unwrap(), "9.0");
    assert!(
        !project
            .path()
            .join("build/recommendations/.pins.version")
            .exists()
    );

    let mut reloaded = load_recommender(&project);
    assert_eq!(
        reloaded.provider("pins").unwrap().override_state(),
        &OverrideState::Stored {
            version: "9.0".to_string()
        }
    );
    assert_eq!(reloaded.lookup("g", "a").unwrap(), "9.0");

    reloaded.reset(None).unwrap();
    reloaded.reset(None).unwrap();
    assert_eq!(reloaded.lookup("g", "a").unwrap(), "9.0");
    assert!(stored.exists());
}

#[test]
fn reset_discards_working_version_only() {
    let project = TempDir::new().unwrap();
    write_config(
        &project,
        json!({
            "providers": [{ "name": "pins", "kind": "properties", "entries": { "g:a": "1.0" } }]
        }),
    );

    let mut recommender = load_recommender(&project);
    recommender.set_local("pins", Some("2.0")).unwrap();
    assert_eq!(recommender.lookup("g", "a").unwrap(), "2.0-LOCAL");

    recommender.reset(Some("pins")).unwrap();

    assert_eq!(recommender.lookup("g", "a").unwrap(), "1.0");
    assert!(matches!(
        recommender.store("pins"),
        Err(RecommendError::NothingToStore { .. })
    ));
}

#[test]
fn working_version_is_picked_up_by_new_instance() {
    let project = TempDir::new().unwrap();
    write_config(
        &project,
        json!({
            "versionParameters": { "pins": "4.2" },
            "providers": [{ "name": "pins", "kind": "properties", "entries": { "g:a": "1.0" } }]
        }),
    );

    load_recommender(&project).set("pins", None).unwrap();
    let reloaded = load_recommender(&project);

    assert_eq!(
        reloaded.provider("pins").unwrap().override_state(),
        &OverrideState::Working {
            version: "4.2".to_string(),
            local: false
        }
    );
}

#[test]
fn local_version_reads_configured_descriptor() {
    let project = TempDir::new().unwrap();
    publish_platform(&project);
    write_config(
        &project,
        json!({
            "providers": [{ "name": "platform", "kind": "ivy", "module": "com.acme:platform:1.0" }]
        }),
    );

    let mut recommender = load_recommender(&project);
    let version = recommender.set_local("platform", None).unwrap();

    assert_eq!(version, "1.0-LOCAL");
    let map = recommender
        .provider("platform")
        .unwrap()
        .version_map(recommender.repository())
        .unwrap();
    assert_eq!(map.lookup("g", "a"), Some("1"));
    assert_eq!(map.lookup("com.acme", "platform"), Some("1.0-LOCAL"));
}

#[tokio::test]
async fn update_adopts_newest_matching_published_version() {
    let project = TempDir::new().unwrap();
    publish_platform(&project);
    let repo = project.path().join("repository");
    publish_ivy(&repo, "com.acme", "platform", "1.1", &[("g", "a", "2")]);
    publish_ivy(&repo, "com.acme", "platform", "2.0-SNAPSHOT", &[]);
    write_config(
        &project,
        json!({
            "providers": [{ "name": "platform", "kind": "ivy", "module": "com.acme:platform:1.0" }],
            "update": { "items": [{ "modulePattern": "com\\.acme", "searchPattern": "1\\.\\d+" }] }
        }),
    );

    let mut recommender = load_recommender(&project);
    let registry = LocalRepository::new(&repo, Default::default());
    let outcome = UpdateEngine::new(&registry)
        .update(&mut recommender, "platform")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            from: "1.0".to_string(),
            to: "1.1".to_string()
        }
    );
    let map = recommender
        .provider("platform")
        .unwrap()
        .version_map(recommender.repository())
        .unwrap();
    assert_eq!(map.lookup("g", "a"), Some("2"));
}

#[tokio::test]
async fn update_after_set_local_adopts_published_patch_release() {
    let project = TempDir::new().unwrap();
    let repo = project.path().join("repository");
    publish_ivy(&repo, "com.acme", "platform", "1.0.0", &[("g", "a", "1")]);
    publish_ivy(&repo, "com.acme", "platform", "1.0.1", &[("g", "a", "2")]);
    write_config(
        &project,
        json!({
            "providers": [{ "name": "platform", "kind": "ivy", "module": "com.acme:platform:1.0.0" }],
            "update": { "items": [{ "modulePattern": "com\\.acme", "searchPattern": "1\\.0\\.\\d+" }] }
        }),
    );
    let registry = MockRegistry::new().with_versions(
        "com.acme:platform",
        vec!["1.0.0", "1.0.1", "1.1.0-SNAPSHOT"],
    );

    let mut recommender = load_recommender(&project);
    assert_eq!(
        recommender.set_local("platform", None).unwrap(),
        "1.0.0-LOCAL"
    );
    let outcome = UpdateEngine::new(&registry)
        .update(&mut recommender, "platform")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            from: "1.0.0-LOCAL".to_string(),
            to: "1.0.1".to_string()
        }
    );
    assert_eq!(recommender.lookup("g", "a").unwrap(), "2");
}

#[tokio::test]
async fn update_all_isolates_failures_and_honors_excludes() {
    let project = TempDir::new().unwrap();
    publish_platform(&project);
    write_config(
        &project,
        json!({
            "providers": [
                { "name": "platform", "kind": "ivy", "module": "com.acme:platform:1.0" },
                { "name": "tools", "kind": "ivy", "module": "com.acme:tools:3.0", "transitive": false },
                { "name": "frozen", "kind": "ivy", "module": "com.acme:frozen:1.0", "excludes": ["com.acme:frozen"] }
            ]
        }),
    );
    let repo = project.path().join("repository");
    publish_ivy(&repo, "com.acme", "tools", "3.0", &[]);
    publish_ivy(&repo, "com.acme", "frozen", "1.0", &[]);
    let registry = MockRegistry::new()
        .with_versions("com.acme:platform", vec!["1.0", "1.2", "0.9"])
        .with_versions("com.acme:frozen", vec!["1.0", "5.0"]);

    let mut recommender = load_recommender(&project);
    let results = UpdateEngine::new(&registry)
        .update_all(&mut recommender)
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].1.as_ref().unwrap(),
        &UpdateOutcome::Updated {
            from: "1.0".to_string(),
            to: "1.2".to_string()
        }
    );
    assert!(matches!(
        results[1].1,
        Err(RecommendError::UpdateQuery { .. })
    ));
    assert_eq!(results[2].1.as_ref().unwrap(), &UpdateOutcome::Excluded);
    assert_eq!(
        recommender.provider("frozen").unwrap().current_version(),
        Some("1.0")
    );
}

#[test]
fn patch_ivy_uses_recommended_versions() {
    let project = TempDir::new().unwrap();
    write_config(
        &project,
        json!({
            "providers": [{ "name": "pins", "kind": "properties", "entries": { "g:a": "1.0" } }]
        }),
    );
    let recommender = load_recommender(&project);

    let result = patch_ivy(
        r#"<ivy-module version="2.0"><dependencies><dependency org="g" name="a"/><dependency org="x" name="y"/></dependencies></ivy-module>"#,
        |group, name| recommender.lookup(group, name).ok(),
    )
    .unwrap();

    assert_eq!(result.patched, 1);
    assert_eq!(result.warnings.len(), 1);
    assert!(
        result
            .content
            .contains(r#"<dependency rev="1.0" org="g" name="a"/>"#)
    );
}
