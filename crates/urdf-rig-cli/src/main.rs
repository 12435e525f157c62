//! urdf-rig command line entry point

use std::env;
use std::path::PathBuf;

use serde::Serialize;
use urdf_rig::scene::SceneSnapshot;
use urdf_rig::{
    ImportOptions, ImportReport, KinematicTree, MemoryScene, NodeId, RobotDocument, RobotImporter,
};

#[derive(Serialize)]
struct ImportOutput {
    report: ImportReport,
    scene: SceneSnapshot,
}

fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urdf_rig=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        print_usage();
        std::process::exit(2);
    };

    let result = match command {
        "import" => import_command(&args),
        "tree" => tree_command(&args),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            Err(format!("unknown command `{command}`"))
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  urdf-rig import <file.urdf> [--config <file.ron>] [--share-root <dir>]");
    eprintln!("                  [--name <armature>] [--json]");
    eprintln!("  urdf-rig tree <file.urdf>");
    eprintln!();
    eprintln!("Set RUST_LOG to change the log filter (default urdf_rig=info).");
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

/// First argument after the command that is neither a flag nor a flag value
fn positional(args: &[String]) -> Option<&str> {
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => {}
            flag if flag.starts_with("--") => {
                rest.next();
            }
            value => return Some(value),
        }
    }
    None
}

fn read_document(args: &[String]) -> Result<RobotDocument, String> {
    let path = positional(args).ok_or("missing URDF file argument")?;
    RobotDocument::read_file(path).map_err(|err| format!("failed to read {path}: {err}"))
}

fn import_command(args: &[String]) -> Result<(), String> {
    let mut options = match parse_flag_value(args, "--config") {
        Some(path) => ImportOptions::load(&path)
            .map_err(|err| format!("failed to load options from {path}: {err}"))?,
        None => ImportOptions::default(),
    };
    if let Some(root) = parse_flag_value(args, "--share-root") {
        options.share_root = Some(PathBuf::from(root));
    }

    let document = read_document(args)?;
    let name = parse_flag_value(args, "--name").unwrap_or_else(|| document.name.clone());

    let importer = RobotImporter::new(options);
    let mut scene = MemoryScene::new();
    let report = importer
        .import_as(&mut scene, &document, &name)
        .map_err(|err| format!("import of {} failed: {err}", document.name))?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    let output = ImportOutput {
        report,
        scene: scene.snapshot(),
    };
    let text = if args.iter().any(|a| a == "--json") {
        serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?
    } else {
        ron::ser::to_string_pretty(&output, ron::ser::PrettyConfig::default())
            .map_err(|err| err.to_string())?
    };
    println!("{text}");
    Ok(())
}

fn tree_command(args: &[String]) -> Result<(), String> {
    let document = read_document(args)?;
    let tree = KinematicTree::build(&document).map_err(|err| err.to_string())?;

    println!("{} (base link {})", tree.robot_name, tree.base_link.name);
    for &root in tree.roots() {
        print_node(&tree, root, 1);
    }
    Ok(())
}

fn print_node(tree: &KinematicTree, id: NodeId, depth: usize) {
    let node = tree.node(id);
    let indent = "  ".repeat(depth);
    let mut line = format!("{indent}{} [{}] -> {}", node.name, node.kind, node.link.name);
    if let Some(axis) = node.axis {
        line.push_str(&format!(" axis ({}, {}, {})", axis.x, axis.y, axis.z));
    }
    if let Some(limit) = node.limit {
        line.push_str(&format!(" limit [{}, {}]", limit.lower, limit.upper));
    }
    println!("{line}");

    for &child in &node.children {
        print_node(tree, child, depth + 1);
    }
}
