use cleave::{
    AttrGraph, Attrs, DetectionOptions, FordFulkerson, NodeSegments, PositionScope, RunLength,
    SkeletonScores, SplitOptions, SplitStats, Splitter,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Cleave(cleave::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Cleave(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<cleave::Error> for CliError {
    fn from(value: cleave::Error) -> Self {
        Self::Cleave(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Split,
    RandVoi,
    Detection,
    RunLength,
}

#[derive(Debug, Clone, Copy)]
struct Positions(PositionScope);

impl FromStr for Positions {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self(PositionScope::AllNodes)),
            "groups" => Ok(Self(PositionScope::GroupNodes)),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    epsilon: Option<f64>,
    positions: PositionScope,
    split_attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeIn {
    id: String,
    #[serde(default)]
    attrs: Attrs,
}

#[derive(Debug, Deserialize)]
struct EdgeIn {
    source: String,
    target: String,
    #[serde(default)]
    attrs: Attrs,
}

fn default_weight_attribute() -> String {
    "weight".to_string()
}

#[derive(Debug, Deserialize)]
struct SplitDocument {
    nodes: Vec<NodeIn>,
    #[serde(default)]
    edges: Vec<EdgeIn>,
    groups: Vec<Vec<String>>,
    position_attributes: Vec<String>,
    #[serde(default = "default_weight_attribute")]
    weight_attribute: String,
}

#[derive(Debug, Deserialize)]
struct RandVoiDocument {
    truth: Vec<u64>,
    test: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct DetectionDocument {
    truth: Vec<u64>,
    test: Vec<u64>,
    /// Defaults to a single axis.
    #[serde(default)]
    shape: Option<Vec<usize>>,
    label_ids: Vec<u64>,
    #[serde(flatten)]
    options: DetectionOptions,
}

fn default_skeleton_id_attribute() -> String {
    "skeleton_id".to_string()
}

fn default_edge_length_attribute() -> String {
    "length".to_string()
}

#[derive(Debug, Deserialize)]
struct RunLengthDocument {
    nodes: Vec<NodeIn>,
    #[serde(default)]
    edges: Vec<EdgeIn>,
    segments: NodeSegments,
    #[serde(default = "default_skeleton_id_attribute")]
    skeleton_id_attribute: String,
    #[serde(default = "default_edge_length_attribute")]
    edge_length_attribute: String,
    /// When given, edge lengths are measured from node positions instead of read from edges.
    #[serde(default)]
    position_attributes: Option<Vec<String>>,
    #[serde(default)]
    skeleton_lengths: Option<IndexMap<u64, f64>>,
}

#[derive(Serialize)]
struct SplitOut<'a> {
    num_splits: usize,
    labels: &'a IndexMap<String, usize>,
    stats: &'a SplitStats,
}

#[derive(Serialize)]
struct RunLengthOut {
    #[serde(flatten)]
    run_length: RunLength,
    skeletons: IndexMap<u64, SkeletonScores>,
}

#[derive(Serialize)]
struct NodeOut<'a> {
    id: &'a str,
    attrs: &'a Attrs,
}

#[derive(Serialize)]
struct LabeledOut<'a> {
    num_splits: usize,
    nodes: Vec<NodeOut<'a>>,
}

fn usage() -> &'static str {
    "cleave\n\
\n\
USAGE:\n\
  cleave [split] [--pretty] [--epsilon <e>] [--positions all|groups] [--split-attribute <name>] [<path>|-]\n\
  cleave rand-voi [--pretty] [<path>|-]\n\
  cleave detection [--pretty] [<path>|-]\n\
  cleave run-length [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - split reads {nodes, edges, groups, position_attributes, weight_attribute} and prints\n\
    {num_splits, labels, stats}.\n\
  - --split-attribute prints the nodes with their label stored under <name> instead.\n\
  - rand-voi reads {truth, test} label arrays; truth label 0 is background.\n\
  - detection reads {truth, test, shape, label_ids, matching_score, matching_threshold,\n\
    voxel_size}; matching_score is overlap, iou or distance.\n\
  - run-length reads {nodes, edges, segments, skeleton_id_attribute, edge_length_attribute,\n\
    position_attributes, skeleton_lengths} and prints {erl, merge_stats, split_stats,\n\
    skeletons}.\n\
  - Log verbosity is controlled by CLEAVE_LOG (default: warn).\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "split" => args.command = Command::Split,
            "rand-voi" => args.command = Command::RandVoi,
            "detection" => args.command = Command::Detection,
            "run-length" => args.command = Command::RunLength,
            "--pretty" => args.pretty = true,
            "--epsilon" => {
                let Some(eps) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let eps = eps.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(eps.is_finite() && eps >= 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.epsilon = Some(eps);
            }
            "--positions" => {
                let Some(scope) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.positions = scope
                    .parse::<Positions>()
                    .map_err(|_| CliError::Usage(usage()))?
                    .0;
            }
            "--split-attribute" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if name.trim().is_empty() {
                    return Err(CliError::Usage(usage()));
                }
                args.split_attribute = Some(name.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

/// Edges may only connect declared nodes; the graph container would silently create them.
/// Nodes and edges may each be declared once; `a -- b` and `b -- a` are the same edge.
fn build_graph(nodes: &[NodeIn], edges: &[EdgeIn]) -> Result<AttrGraph, CliError> {
    let mut graph = AttrGraph::new();
    for node in nodes {
        if graph.has_node(&node.id) {
            return Err(cleave::Error::DuplicateNode {
                node: node.id.clone(),
            }
            .into());
        }
        graph.set_node(node.id.clone(), node.attrs.clone());
    }
    for edge in edges {
        let name = || format!("{} -- {}", edge.source, edge.target);
        for end in [&edge.source, &edge.target] {
            if !graph.has_node(end) {
                return Err(cleave::Error::MissingEndpoint { edge: name() }.into());
            }
        }
        if graph.has_edge(&edge.source, &edge.target) {
            return Err(cleave::Error::DuplicateEdge { edge: name() }.into());
        }
        graph.set_edge_with_label(edge.source.clone(), edge.target.clone(), edge.attrs.clone());
    }
    Ok(graph)
}

fn run_split(args: &Args, text: &str) -> Result<(), CliError> {
    let doc: SplitDocument = serde_json::from_str(text)?;
    let mut graph = build_graph(&doc.nodes, &doc.edges)?;

    let cut = args
        .epsilon
        .map(FordFulkerson::new)
        .unwrap_or_default();
    let splitter = Splitter::with_min_cut(cut).with_options(SplitOptions {
        positions: args.positions,
    });
    let result = splitter.split(
        &graph,
        &doc.groups,
        &doc.position_attributes,
        &doc.weight_attribute,
    )?;

    match args.split_attribute.as_deref() {
        None => write_json(
            &SplitOut {
                num_splits: result.num_splits,
                labels: &result.labels,
                stats: &result.stats,
            },
            args.pretty,
        ),
        Some(name) => {
            graph.for_each_node_mut(|id, attrs| {
                if let Some(label) = result.label(id) {
                    attrs.set(name, label as f64);
                }
            });
            let mut nodes = Vec::with_capacity(graph.node_count());
            for id in graph.nodes() {
                if let Some(attrs) = graph.node(id) {
                    nodes.push(NodeOut { id, attrs });
                }
            }
            write_json(
                &LabeledOut {
                    num_splits: result.num_splits,
                    nodes,
                },
                args.pretty,
            )
        }
    }
}

fn run_rand_voi(args: &Args, text: &str) -> Result<(), CliError> {
    let doc: RandVoiDocument = serde_json::from_str(text)?;
    let scores = cleave::rand_voi(&doc.truth, &doc.test)?;
    write_json(&scores, args.pretty)
}

fn run_detection(args: &Args, text: &str) -> Result<(), CliError> {
    let doc: DetectionDocument = serde_json::from_str(text)?;
    let shape = doc.shape.unwrap_or_else(|| vec![doc.truth.len()]);
    let scores =
        cleave::detection_scores(&doc.truth, &doc.test, &shape, &doc.label_ids, &doc.options)?;
    write_json(&scores, args.pretty)
}

fn run_run_length(args: &Args, text: &str) -> Result<(), CliError> {
    let doc: RunLengthDocument = serde_json::from_str(text)?;
    let mut graph = build_graph(&doc.nodes, &doc.edges)?;
    if let Some(positions) = &doc.position_attributes {
        cleave::store_edge_lengths(&mut graph, positions, &doc.edge_length_attribute)?;
    }

    let skeletons =
        cleave::evaluate_skeletons(&graph, &doc.skeleton_id_attribute, &doc.segments)?;
    let run_length = cleave::expected_run_length(
        &graph,
        &doc.skeleton_id_attribute,
        &doc.edge_length_attribute,
        &doc.segments,
        doc.skeleton_lengths.as_ref(),
    )?;
    write_json(
        &RunLengthOut {
            run_length,
            skeletons,
        },
        args.pretty,
    )
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    match args.command {
        Command::Split => run_split(&args, &text),
        Command::RandVoi => run_rand_voi(&args, &text),
        Command::Detection => run_detection(&args, &text),
        Command::RunLength => run_run_length(&args, &text),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CLEAVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    if let Err(err) = run(args) {
        tracing::debug!(error = ?err, "command failed");
        eprintln!("{err}");
        std::process::exit(1);
    }
}
