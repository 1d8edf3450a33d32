// crates/muster-reports/src/sbom/tests.rs
// ============================================================================
// Module: SBOM Builder Tests
// Description: Parser rules, purl normalization, dedup, and document shape.
// Purpose: Pin the per-ecosystem parsing semantics.
// Dependencies: muster-core, muster-store-sqlite, tempfile
// ============================================================================

use std::path::Path;

use muster_core::ComplianceStore;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::Timestamp;
use muster_store_sqlite::SqliteComplianceStore;
use muster_store_sqlite::SqliteStoreConfig;

use super::Component;
use super::generate_sbom;
use super::parse_build_gradle;
use super::parse_cargo_toml;
use super::parse_csproj;
use super::parse_go_mod;
use super::parse_package_json;
use super::parse_package_lock;
use super::parse_pom_xml;
use super::parse_pyproject_toml;
use super::parse_requirements_txt;

/// Runs a parser over fixture text.
fn run(parser: fn(&str, &mut Vec<Component>), text: &str) -> Vec<Component> {
    let mut components = Vec::new();
    parser(text, &mut components);
    components
}

#[test]
fn requirements_txt_skips_comments_and_urls() {
    let components = run(
        parse_requirements_txt,
        "# deps\nrequests==2.31.0\nFlask_Login>=0.6\n-r other.txt\nhttps://example/x.whl\npydantic\n",
    );
    assert_eq!(components.len(), 3);
    assert_eq!(components[0].purl, "pkg:pypi/requests@2.31.0");
    // Underscores normalize to dashes and names lowercase.
    assert_eq!(components[1].purl, "pkg:pypi/flask-login@0.6");
    // Unpinned dependencies omit the version segment.
    assert_eq!(components[2].purl, "pkg:pypi/pydantic");
    assert_eq!(components[2].version, "unspecified");
}

#[test]
fn pyproject_dependencies_array_parses_quoted_specs() {
    let components = run(
        parse_pyproject_toml,
        "[project]\nname = \"demo\"\ndependencies = [\n  \"requests==2.31.0\",\n  'rich>=13.0,<14',\n]\n",
    );
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].purl, "pkg:pypi/requests@2.31.0");
    // Multiple version conditions keep only the first.
    assert_eq!(components[1].purl, "pkg:pypi/rich@13.0");
}

#[test]
fn package_json_strips_range_operators() {
    let components = run(
        parse_package_json,
        r#"{"dependencies": {"lodash": "^4.17.21", "@types/node": "~20.1.0"},
            "devDependencies": {"jest": "*"}}"#,
    );
    let lodash = components.iter().find(|c| c.name == "lodash").map(|c| c.purl.clone());
    assert_eq!(lodash.as_deref(), Some("pkg:npm/lodash@4.17.21"));
    let scoped = components.iter().find(|c| c.name == "node").cloned();
    let scoped = scoped.as_ref();
    assert_eq!(scoped.map(|c| c.group.as_str()), Some("@types"));
    assert_eq!(scoped.map(|c| c.purl.as_str()), Some("pkg:npm/@types%2Fnode@20.1.0"));
    let jest = components.iter().find(|c| c.name == "jest").cloned();
    assert_eq!(jest.as_ref().map(|c| c.version.as_str()), Some("unspecified"));
    assert_eq!(jest.as_ref().map(|c| c.scope.as_str()), Some("optional"));
}

#[test]
fn package_lock_prefers_v2_packages_and_skips_nested() {
    let components = run(
        parse_package_lock,
        r#"{"lockfileVersion": 3, "packages": {
            "": {"name": "root"},
            "node_modules/lodash": {"version": "4.17.21"},
            "node_modules/a/node_modules/b": {"version": "1.0.0"},
            "node_modules/jest": {"version": "29.0.0", "dev": true}
        }}"#,
    );
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].purl, "pkg:npm/lodash@4.17.21");
    assert_eq!(components[1].scope, "optional");
}

#[test]
fn go_mod_handles_blocks_and_indirect_comments() {
    let components = run(
        parse_go_mod,
        "module example.com/app\n\nrequire (\n\tgithub.com/pkg/errors v0.9.1 // indirect\n\tgolang.org/x/sync v0.7.0\n)\nrequire github.com/spf13/cobra v1.8.0\n",
    );
    assert_eq!(components.len(), 3);
    assert_eq!(components[0].purl, "pkg:golang/github.com/pkg/errors@v0.9.1");
    assert_eq!(components[2].purl, "pkg:golang/github.com/spf13/cobra@v1.8.0");
}

#[test]
fn cargo_toml_is_section_aware() {
    let components = run(
        parse_cargo_toml,
        "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[dependencies]\nserde = \"1.0\"\nrusqlite = { version = \"0.38\", features = [\"bundled\"] }\n\n[dev-dependencies]\ntempfile = \"3.10\"\n",
    );
    assert_eq!(components.len(), 3);
    assert_eq!(components[0].purl, "pkg:cargo/serde@1.0");
    assert_eq!(components[1].purl, "pkg:cargo/rusqlite@0.38");
    assert_eq!(components[2].scope, "optional");
    // The [package] name/version lines are never treated as dependencies.
    assert!(!components.iter().any(|c| c.name == "name" || c.name == "version"));
}

#[test]
fn pom_xml_maps_test_scope_to_optional() {
    let components = run(
        parse_pom_xml,
        "<project><dependencies>\
         <dependency><groupId>org.junit</groupId><artifactId>junit</artifactId>\
         <version>5.10.0</version><scope>test</scope></dependency>\
         <dependency><groupId>com.fasterxml</groupId><artifactId>jackson</artifactId></dependency>\
         </dependencies></project>",
    );
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].purl, "pkg:maven/org.junit/junit@5.10.0");
    assert_eq!(components[0].scope, "optional");
    // Missing version falls back to the managed marker.
    assert_eq!(components[1].version, "managed");
}

#[test]
fn gradle_configurations_map_to_scopes() {
    let components = run(
        parse_build_gradle,
        "dependencies {\n  implementation 'com.google.guava:guava:33.0.0'\n  testImplementation \"org.junit:junit:5.10.0\"\n}\n",
    );
    assert_eq!(components.len(), 2);
    assert_eq!(components[0].purl, "pkg:maven/com.google.guava/guava@33.0.0");
    assert_eq!(components[0].scope, "required");
    assert_eq!(components[1].scope, "optional");
}

#[test]
fn csproj_is_attribute_order_tolerant() {
    let components = run(
        parse_csproj,
        "<Project>\
         <PackageReference Include=\"Newtonsoft.Json\" Version=\"13.0.3\" />\
         <PackageReference Version=\"8.0.0\" Include=\"Serilog\" />\
         <PackageReference Include=\"Dapper\">\n<Version>2.1.0</Version>\n</PackageReference>\
         </Project>",
    );
    assert_eq!(components.len(), 3);
    assert_eq!(components[0].purl, "pkg:nuget/Newtonsoft.Json@13.0.3");
    assert_eq!(components[1].purl, "pkg:nuget/Serilog@8.0.0");
    assert_eq!(components[2].purl, "pkg:nuget/Dapper@2.1.0");
}

#[test]
fn cross_ecosystem_duplicates_dedup_by_purl() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = dir.path().join("app");
    std::fs::create_dir_all(&app)?;
    std::fs::write(app.join("requirements.txt"), "requests==2.31.0\n")?;
    std::fs::write(app.join("package.json"), r#"{"dependencies": {"requests": "1.0.0"}}"#)?;
    // The same pypi purl appears again via pyproject.toml.
    std::fs::write(
        app.join("pyproject.toml"),
        "[project]\ndependencies = [\"requests==2.31.0\"]\n",
    )?;

    let store = open_store(dir.path(), &app)?;
    let output = generate_sbom(
        &store,
        &ProjectId::new("proj-sbom"),
        None,
        dir.path(),
        Timestamp::from_unix_millis(0),
    )?;

    // Different ecosystems keep distinct purls; duplicate pypi purl collapses.
    assert_eq!(output.component_count, 2);
    assert_eq!(output.version, "1.0");
    assert!(output.output_file.exists());
    let document = output.document;
    let components = document
        .get("components")
        .and_then(serde_json::Value::as_array)
        .ok_or("missing components")?;
    assert_eq!(components.len(), 2);
    for component in components {
        let bom_ref = component
            .get("bom-ref")
            .and_then(serde_json::Value::as_str)
            .ok_or("missing bom-ref")?;
        assert_eq!(bom_ref.len(), 16);
    }
    assert!(
        document
            .get("metadata")
            .and_then(|m| m.get("properties"))
            .and_then(serde_json::Value::as_array)
            .is_some_and(|props| {
                props.iter().any(|p| {
                    p.get("value").and_then(serde_json::Value::as_str)
                        == Some("CUI // SP-CTI")
                })
            })
    );

    // A second run increments the recorded version.
    let second = generate_sbom(
        &store,
        &ProjectId::new("proj-sbom"),
        None,
        dir.path(),
        Timestamp::from_unix_millis(0),
    )?;
    assert_eq!(second.version, "2.0");
    Ok(())
}

/// Opens a store with one project rooted at the given directory.
fn open_store(
    dir: &Path,
    app: &Path,
) -> Result<SqliteComplianceStore, Box<dyn std::error::Error>> {
    let store = SqliteComplianceStore::open(&SqliteStoreConfig::for_path(dir.join("m.db")))?;
    store.upsert_project(&Project {
        id: ProjectId::new("proj-sbom"),
        name: "SBOM Fixture".to_string(),
        directory_path: Some(app.to_path_buf()),
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il4,
    })?;
    Ok(store)
}
