use std::io::Write;

use emmyrc_doc::render::markdown::MarkdownSink;
use emmyrc_doc::{
    document, generate_example, load_jsons, render_example, AutoDocOptions, ExampleKind, LoadError, Loader, Registry,
};
use serde_json::{json, Value};

fn settings_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "EmmyRc",
        "description": "Language server settings.",
        "type": "object",
        "properties": {
            "$schema": { "type": "string" },
            "completion": { "$ref": "#/$defs/Completion" },
            "diagnostics": { "$ref": "#/$defs/Diagnostics" },
            "runtime": {
                "type": "object",
                "default": { "version": "Lua5.4" },
                "properties": {
                    "version": { "$ref": "#/$defs/LuaVersion" },
                    "extensions": { "type": "array", "items": { "type": "string" } }
                }
            }
        },
        "$defs": {
            "Completion": {
                "type": "object",
                "description": "Completion settings.",
                "properties": {
                    "enable": { "type": "boolean", "default": true, "x-vscode-setting": true },
                    "callSnippet": { "type": "boolean", "default": false, "x-vscode-setting": true }
                }
            },
            "Diagnostics": {
                "type": "object",
                "properties": {
                    "disable": { "type": "array", "items": { "$ref": "#/$defs/DiagnosticCode" } },
                    "enables": { "type": "array", "items": { "$ref": "#/$defs/DiagnosticCode" } },
                    "severity": {
                        "type": ["object", "null"],
                        "additionalProperties": { "type": "string" }
                    }
                }
            },
            "DiagnosticCode": {
                "oneOf": [
                    { "const": "syntax-error", "description": "Syntax error." },
                    { "const": "unused", "description": "Unused variable." }
                ]
            },
            "LuaVersion": { "type": "string", "enum": ["Lua5.1", "Lua5.4", "LuaJIT"] }
        }
    })
}

fn write_schema(value: &Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    file
}

fn loader() -> (tempfile::NamedTempFile, Loader) {
    let file = write_schema(&settings_schema());
    let registry = load_jsons(file.path(), "EmmyRc").unwrap();
    (file, Loader::new(registry))
}

#[test]
fn signature_of_the_root() {
    let (_file, mut loader) = loader();
    let root = loader.load("EmmyRc").unwrap();
    let printed = root.print(Some(&loader), false);
    assert!(printed.starts_with(r#"{"$schema": string, "completion": {"enable": boolean, "callSnippet": boolean}"#));
    assert!(printed.contains(r#""disable": EmmyRc#/$defs/DiagnosticCode[]"#));
    assert!(printed.contains(r#""severity": {string: string}?"#));
    assert!(printed.contains(r#""version": "Lua5.1" | "Lua5.4" | "LuaJIT""#));
}

#[test]
fn examples_by_scope() {
    let (_file, mut loader) = loader();
    let root = loader.load("EmmyRc").unwrap();

    let all = generate_example(&loader, &root, ExampleKind::All);
    assert_eq!(
        all,
        json!({
            "completion": { "enable": true, "callSnippet": false },
            "diagnostics": { "disable": [], "enables": [], "severity": null },
            "runtime": { "version": "Lua5.4", "extensions": [] }
        })
    );

    let user = generate_example(&loader, &root, ExampleKind::User);
    assert_eq!(user, json!({ "completion": { "enable": true, "callSnippet": false } }));

    let project = generate_example(&loader, &root, ExampleKind::Project);
    assert_eq!(
        project,
        json!({
            "diagnostics": { "disable": [], "enables": [], "severity": null },
            "runtime": { "version": "Lua5.4", "extensions": [] }
        })
    );

    let rendered = render_example(&loader, &root, ExampleKind::User);
    assert_eq!(
        rendered,
        "{\n  \"completion\": {\n    \"enable\": true,\n    \"callSnippet\": false\n  }\n}"
    );
}

#[test]
fn markdown_reference_page() {
    let (_file, mut loader) = loader();
    let options = AutoDocOptions {
        recursive: true,
        title: Some("Settings".into()),
        ..Default::default()
    };
    let mut sink = MarkdownSink::new();
    document(&mut loader, "EmmyRc", &options, &mut sink).unwrap();
    let page = sink.finish();

    assert!(page.starts_with("# Settings\n\n## <a id=\"EmmyRc\"></a>`EmmyRc`\n\nLanguage server settings.\n\n"));
    assert!(page.contains("<a id=\"EmmyRc.completion\"></a>`completion`\n\nCompletion settings."));
    assert!(page.contains("<a id=\"EmmyRc.completion.enable\"></a>`enable`: `boolean = true`"));
    assert!(page.contains("`disable`: [`EmmyRc#DiagnosticCode`](#EmmyRc%23DiagnosticCode)`[]`"));
    assert!(page.contains("`severity`: `{string: string}? = null`"));
    assert!(page.contains("`version` = `\"Lua5.4\"`"));
    assert!(page.contains("# Config types\n\n## <a id=\"EmmyRc%23DiagnosticCode\"></a>`EmmyRc#DiagnosticCode`"));
    assert!(page.contains("<a id=\"EmmyRc%23DiagnosticCode.%22unused%22\"></a>`\"unused\"`\n\nUnused variable."));
    assert!(page.contains("# Index\n\n"));
}

#[test]
fn external_documents_resolve_relative_references() {
    let common = write_schema(&json!({
        "$defs": { "Port": { "type": "integer", "default": 8080, "description": "TCP port." } }
    }));
    let common_name = common.path().file_name().unwrap().to_string_lossy().into_owned();
    let root = json!({
        "type": "object",
        "properties": { "port": { "$ref": format!("{common_name}#/$defs/Port") } }
    });
    let root_file = write_schema(&root);

    let registry = Registry::new()
        .with_json_file("EmmyRc", root_file.path())
        .unwrap()
        .with_json_file(common_name.clone(), common.path())
        .unwrap()
        .crawl();
    let mut loader = Loader::new(registry);
    let ty = loader.load("EmmyRc").unwrap();
    assert_eq!(ty.print(Some(&loader), false), r#"{"port": integer}"#);
    assert_eq!(generate_example(&loader, &ty, ExampleKind::All), json!({ "port": 8080 }));
}

#[test]
fn unreadable_and_malformed_files() {
    let missing = load_jsons("/definitely/not/here.json".as_ref(), "EmmyRc").unwrap_err();
    assert!(matches!(missing, LoadError::Io { .. }));

    let mut broken = tempfile::NamedTempFile::new().unwrap();
    broken.write_all(b"{ not json").unwrap();
    let malformed = load_jsons(broken.path(), "EmmyRc").unwrap_err();
    assert!(matches!(malformed, LoadError::Json { .. }));
}

#[test]
fn recursive_schema_documents_and_terminates() {
    let file = write_schema(&json!({
        "type": "object",
        "properties": { "root": { "$ref": "#/$defs/Node" } },
        "$defs": {
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "children": { "type": "array", "items": { "$ref": "#/$defs/Node" } }
                }
            }
        }
    }));
    let mut loader = Loader::new(load_jsons(file.path(), "EmmyRc").unwrap());
    let root = loader.load("EmmyRc").unwrap();
    assert_eq!(
        root.print(Some(&loader), false),
        r#"{"root": EmmyRc#/$defs/Node}"#
    );
    assert_eq!(
        generate_example(&loader, &root, ExampleKind::All),
        json!({ "root": { "name": "", "children": [] } })
    );

    let mut sink = MarkdownSink::new();
    let options = AutoDocOptions { recursive: true, ..Default::default() };
    document(&mut loader, "EmmyRc", &options, &mut sink).unwrap();
    let page = sink.finish();
    assert!(page.contains("`children`: [`EmmyRc#Node`](#EmmyRc%23Node)`[]`"));
}

#[test]
fn url_identified_schema_links_to_its_shared_types() {
    let file = write_schema(&json!({
        "$id": "https://example.com/emmyrc.json",
        "type": "object",
        "properties": {
            "a": { "$ref": "#/$defs/Shared" },
            "b": { "$ref": "#/$defs/Shared" }
        },
        "$defs": {
            "Shared": { "type": "object", "properties": { "x": { "type": "integer" } } }
        }
    }));
    let mut loader = Loader::new(load_jsons(file.path(), "EmmyRc").unwrap());
    let mut sink = MarkdownSink::new();
    let options = AutoDocOptions { recursive: true, ..Default::default() };
    document(&mut loader, "EmmyRc", &options, &mut sink).unwrap();
    let page = sink.finish();

    let root_anchor = "https%3A%2F%2Fexample.com%2Femmyrc.json";
    let shared_anchor = "https%3A%2F%2Fexample.com%2Femmyrc.json%23Shared";
    assert!(page.contains(&format!("## <a id=\"{root_anchor}\"></a>`https://example.com/emmyrc.json`\n")));
    for name in ["a", "b"] {
        assert!(page.contains(&format!(
            "`{name}`: [`https://example.com/emmyrc.json#Shared`](#{shared_anchor})"
        )));
    }
    assert!(page.contains(&format!(
        "# Config types\n\n## <a id=\"{shared_anchor}\"></a>`https://example.com/emmyrc.json#Shared`"
    )));
    assert!(page.contains("`x`: `integer`"));
}

#[test]
fn override_schema_markers_count_as_user_settings() {
    let file = write_schema(&json!({
        "type": "object",
        "properties": {
            "enable": { "type": "boolean", "default": true, "x-vscode-setting": true },
            "postfix": {
                "type": "string",
                "default": "@",
                "x-vscode-setting": { "type": "string", "enum": ["@", ".", ":"] }
            },
            "shared": { "type": "boolean" }
        }
    }));
    let mut loader = Loader::new(load_jsons(file.path(), "EmmyRc").unwrap());
    let root = loader.load("EmmyRc").unwrap();
    assert_eq!(
        generate_example(&loader, &root, ExampleKind::User),
        json!({ "enable": true, "postfix": "@" })
    );
}
