use std::{fs, path::Path};

use tempfile::tempdir;

use trellis::{
    diagram::Diagram,
    entity::Entity,
    geometry::{Dimension, Point},
    inheritance::Inheritance,
    relation::{EndpointRole, Relation, RelationEndpoint},
};
use trellis_cli::{Args, Command, run};

fn args(command: Command) -> Args {
    Args {
        command,
        config: None,
        log_level: "off".to_string(),
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Writes a small hierarchy: `Shape` with subclasses `Circle` and `Square`,
/// plus an unrelated `Logger` that uses `Circle`.
fn write_sample(path: &Path) {
    let mut diagram = Diagram::new();
    let size = Dimension::new(90, 40);
    let shape = diagram.add_entity(Entity::new(Point::new(100, 10), size).with_name("Shape"));
    let circle = diagram.add_entity(Entity::new(Point::new(20, 120), size).with_name("Circle"));
    let square = diagram.add_entity(Entity::new(Point::new(180, 120), size).with_name("Square"));
    let logger = diagram.add_entity(Entity::new(Point::new(20, 240), size).with_name("Logger"));

    let node = diagram
        .add_inheritance(Inheritance::new(shape, false, Point::new(140, 80)))
        .expect("Parent exists");
    for child in [circle, square] {
        let relation = Relation::new(
            RelationEndpoint::entity(child, EndpointRole::Start),
            RelationEndpoint::inheritance(node, EndpointRole::End),
        );
        diagram.add_relation(relation).expect("Endpoints exist");
    }
    diagram
        .add_relation(Relation::between_entities(logger, circle))
        .expect("Endpoints exist");

    trellis::save(&diagram, path).expect("Failed to write sample");
}

#[test]
fn e2e_new_then_check() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("empty.ded");

    run(&args(Command::New {
        output: path_arg(&output),
    }))
    .expect("new should succeed");
    run(&args(Command::Check {
        file: path_arg(&output),
    }))
    .expect("check should succeed");

    let diagram = trellis::load(&output).expect("Failed to load");
    assert!(diagram.is_empty());
    assert_eq!(diagram.window_size(), Dimension::new(700, 500));
}

#[test]
fn e2e_new_uses_config_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config = temp_dir.path().join("config.toml");
    let output = temp_dir.path().join("wide.ded");
    fs::write(&config, "[document]\nwindow_width = 1600\n").expect("Failed to write config");

    let mut new_args = args(Command::New {
        output: path_arg(&output),
    });
    new_args.config = Some(path_arg(&config));
    run(&new_args).expect("new should succeed");

    let diagram = trellis::load(&output).expect("Failed to load");
    assert_eq!(diagram.window_size(), Dimension::new(1600, 500));
}

#[test]
fn e2e_convert_legacy_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("old.ded");
    let output = temp_dir.path().join("new.ded");

    let mut bytes = Vec::new();
    for value in [0x2B04_4C63_i32, 1, 700, 500, 1, 5, 6, 10, 10] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes.extend_from_slice(b"Legacy\0");
    for value in [0x64E2_C40F_i32, 0, 0x3782_64D9] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    fs::write(&input, bytes).expect("Failed to write legacy file");

    run(&args(Command::Convert {
        input: path_arg(&input),
        output: path_arg(&output),
    }))
    .expect("convert should succeed");

    let text = fs::read_to_string(&output).expect("Output should be text");
    assert!(text.contains("\"type\": \"Diagram Editor Diagram\""));
    assert!(text.contains("\"Legacy\""));
}

#[test]
fn e2e_extract_by_name() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("shapes.ded");
    let output = temp_dir.path().join("extracted.ded");
    write_sample(&input);

    // "S" matches Shape and Square; Circle and Logger drop out with every
    // relation touching them.
    run(&args(Command::Extract {
        input: path_arg(&input),
        output: path_arg(&output),
        name: "S".to_string(),
    }))
    .expect("extract should succeed");

    let extracted = trellis::load(&output).expect("Failed to load");
    let names: Vec<_> = extracted.entities().map(|(_, e)| e.name.as_str()).collect();
    assert_eq!(names, ["Shape", "Square"]);
    assert_eq!(extracted.inheritance_count(), 1);
    assert_eq!(extracted.relation_count(), 1);
    extracted.self_check().expect("Extracted diagram is closed");
}

#[test]
fn e2e_error_cases() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let garbage = temp_dir.path().join("garbage.ded");
    fs::write(&garbage, [0xFF, 0x00, 0x12]).expect("Failed to write");

    let failing = [
        Command::Check {
            file: path_arg(&temp_dir.path().join("absent.ded")),
        },
        Command::Check {
            file: path_arg(&garbage),
        },
        Command::Convert {
            input: path_arg(&garbage),
            output: path_arg(&temp_dir.path().join("out.ded")),
        },
    ];

    for command in failing {
        let description = format!("{command:?}");
        assert!(
            run(&args(command)).is_err(),
            "{description} should have failed"
        );
    }
    assert!(!temp_dir.path().join("out.ded").exists());
}
