//! Tests for the compiler pipeline, its options and the stored artifact.
mod common;
use common::*;
use kumiki::artifact::CompiledGraph;
use kumiki::prelude::*;

const COUNTER_JSON: &str = r#"{
  "name": "Counter",
  "fields": [
    { "name": "counter", "fieldType": { "name": "int" }, "initializer": { "kind": "literal", "literal": 5, "resultType": { "name": "int" } } }
  ],
  "methods": [
    {
      "name": "Start",
      "body": [
        {
          "kind": "expression",
          "expressions": [
            {
              "kind": "postfixUnary",
              "operator": "++",
              "resultType": { "name": "int" },
              "children": [ { "kind": "identifier", "name": "counter", "resultType": { "name": "int" } } ]
            }
          ]
        }
      ]
    }
  ]
}"#;

#[test]
fn test_compile_counter_class() {
    let artifacts = compile(create_counter_class());
    let graph = &artifacts.graph;

    assert_eq!(artifacts.name, "Counter");
    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    assert_eq!(graph.count_op(Op::EventOnStart), 1);
    let write = only(graph, Op::VariableSet);
    let add = graph.value_source(write.index, "value").expect("value wired");
    assert_eq!(add.op, Op::MathAdd);
    assert_eq!(add.value_in("b").and_then(|i| i.literal.clone()), Some(Literal::Int(1)));
    let start = only(graph, Op::EventOnStart);
    assert_eq!(graph.flow_successor(start.index, "out").map(|n| n.index), Some(write.index));

    let (_, counter) = graph.variable_by_name("counter").expect("field declared");
    assert_eq!(counter.initial, Some(Literal::Int(0)));
}

#[test]
fn test_class_without_entry_points_fails() {
    let class = class("Helper", Vec::new(), vec![method("Compute", Vec::new())]);
    let result = Compiler::builder(class).build().compile();

    match result {
        Err(CompileError::NoEntryPoints { class, entry_points }) => {
            assert_eq!(class, "Helper");
            assert_eq!(entry_points, vec!["Start".to_string(), "Update".to_string()]);
        }
        other => panic!("expected NoEntryPoints, got {:?}", other.map(|a| a.name)),
    }
}

#[test]
fn test_invalid_options_are_rejected() {
    let result = Compiler::builder(create_counter_class())
        .with_list_capacity(0)
        .build()
        .compile();
    assert!(matches!(result, Err(CompileError::InvalidOptions(_))));

    let options = CompilerOptions {
        entry_points: Vec::new(),
        ..CompilerOptions::default()
    };
    let result = Compiler::builder(create_counter_class())
        .with_options(options)
        .build()
        .compile();
    assert!(matches!(result, Err(CompileError::InvalidOptions(_))));
}

#[test]
fn test_builder_applies_options() {
    let compiler = Compiler::builder(create_counter_class())
        .with_space_conversion(false)
        .with_list_capacity(4)
        .with_max_inline_depth(2)
        .with_entry_point("OnHit")
        .with_entry_point("Start")
        .build();

    let options = compiler.options();
    assert!(!options.space_conversion);
    assert_eq!(options.default_list_capacity, 4);
    assert_eq!(options.max_inline_depth, 2);
    assert_eq!(options.entry_points, vec!["Start", "Update", "OnHit"]);
}

#[test]
fn test_options_load_from_partial_json() {
    let options: CompilerOptions =
        serde_json::from_str(r#"{ "spaceConversion": false, "entryPoints": ["Awake"] }"#)
            .expect("options parse");

    assert!(!options.space_conversion);
    assert_eq!(options.entry_points, vec!["Awake"]);
    assert_eq!(options.default_list_capacity, CompilerOptions::default().default_list_capacity);
    assert!(options.validate);
}

#[test]
fn test_validation_can_be_disabled() {
    let options = CompilerOptions {
        validate: false,
        ..CompilerOptions::default()
    };
    // Without a resolver the write's target id stays dangling.
    let target = member(Some(own_transform()), "Transform", "localPosition", "Vector3");
    let position = new_obj("Vector3", vec![int(1), int(2), int(3)]);
    let class = class(
        "Mover",
        Vec::new(),
        vec![method("Start", vec![assign_stmt(target, "=", position)])],
    );

    let artifacts = Compiler::builder(class)
        .with_options(options)
        .build()
        .compile()
        .expect("Failed to compile");
    assert!(artifacts.validation.is_clean());
    assert_eq!(artifacts.diagnostics.len(), 1);
    assert!(!artifacts.is_clean());
}

#[test]
fn test_class_loads_from_json() {
    let class = ClassInfo::from_json(COUNTER_JSON).expect("class parses");
    assert_eq!(class.name, "Counter");
    assert!(class.method("Start").is_some());
    assert_eq!(class.field("counter").map(|f| f.field_type.name.as_str()), Some("int"));

    let artifacts = compile(class);
    assert!(artifacts.is_clean(), "{:?}\n{}", artifacts.diagnostics, artifacts.validation);
    let (_, counter) = artifacts
        .graph
        .variable_by_name("counter")
        .expect("field declared");
    assert_eq!(counter.initial, Some(Literal::Int(5)));
    assert_eq!(artifacts.graph.count_op(Op::VariableSet), 1);
}

#[test]
fn test_malformed_json_is_rejected() {
    let result = ClassInfo::from_json(r#"{ "name": "Broken", "methods": [ { "body": [ { } ] } ] }"#);
    assert!(matches!(result, Err(AstLoadError::JsonParseError(_))));
}

#[test]
fn test_compiled_graph_round_trips_through_bytes() {
    let compiled = CompiledGraph::from(compile(create_counter_class()));

    let bytes = compiled.to_bytes().expect("graph serializes");
    let restored = CompiledGraph::from_bytes(&bytes).expect("graph deserializes");
    assert_eq!(restored, compiled);

    assert!(matches!(
        CompiledGraph::from_bytes(&bytes[..bytes.len() / 2]),
        Err(ArtifactError::Deserialization(_))
    ));
}

#[test]
fn test_compiled_graph_saves_to_file() {
    let compiled = CompiledGraph::from(compile(create_counter_class()));
    let path = std::env::temp_dir().join("kumiki_counter_graph.bin");
    let path = path.to_str().expect("temp path is utf-8");

    compiled.save(path).expect("graph saved");
    let loaded = CompiledGraph::from_file(path).expect("graph loaded");
    assert_eq!(loaded, compiled);
    let _ = std::fs::remove_file(path);

    assert!(matches!(
        CompiledGraph::from_file("/nonexistent/kumiki/graph.bin"),
        Err(ArtifactError::Io { .. })
    ));
}

#[test]
fn test_compiled_graph_json_uses_op_identifiers() {
    let compiled = CompiledGraph::from(compile(create_counter_class()));
    let json = compiled.to_json_pretty().expect("graph serializes");

    assert!(json.contains("\"name\": \"Counter\""));
    assert!(json.contains("\"event/onStart\""));
    assert!(json.contains("\"variable/set\""));
}
