use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, Rgb, RgbImage};
use log::info;
use serde::{Deserialize, Serialize};
use skelvec::{
    CubicBezier, IdentitySkeleton, NodeKind, PixelGraph, Point2f, Raster, TopologicalGraph,
    VectorDrawing, Vectorization, VectorizeConfig, Vectorizer, build_graph,
};

#[derive(Parser, Debug)]
#[command(name = "sv_gallery")]
#[command(about = "Run the skeleton vectorizer on external fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full pipeline: topology, curve refinement, stroke grouping.
    #[command(name = "vectorize")]
    Vectorize(VectorizeArgs),
    /// Topological graph only.
    #[command(name = "topology")]
    Topology(CommonArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Skeleton image; pixels at or above the threshold are skeleton.
    #[arg(long, required = true)]
    input: PathBuf,
    /// Optional stroke width image, one gray level per pixel of width.
    ///
    /// Fit error is weighted by `1 - w/2` and clamped at zero, so pixels of
    /// width 2 or more never trigger a split.
    #[arg(long)]
    widths: Option<PathBuf>,
    /// JSON file with vectorizer options; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Treat dark pixels as skeleton.
    #[arg(long, default_value_t = false)]
    dark_ink: bool,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct VectorizeArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Draw a circle at every node anchor.
    #[arg(long, default_value_t = false)]
    markers: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GraphNodeDto {
    id: usize,
    kind: &'static str,
    x: f32,
    y: f32,
    degree: usize,
    pixels: usize,
}

#[derive(Debug, Clone, Serialize)]
struct GraphEdgeDto {
    id: usize,
    a: usize,
    b: usize,
    is_loop: bool,
    pixels: Vec<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    curve: Option<CurveDto>,
}

#[derive(Debug, Clone, Serialize)]
struct CurveDto {
    control_points: [[f32; 2]; 4],
    error: f32,
    fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
struct SuperEdgeDto {
    id: usize,
    nodes: Vec<usize>,
    edges: Vec<usize>,
    closed: bool,
}

#[derive(Debug, Clone, Serialize)]
struct GraphDto {
    width: usize,
    height: usize,
    nodes: Vec<GraphNodeDto>,
    edges: Vec<GraphEdgeDto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    super_edges: Vec<SuperEdgeDto>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaTopology {
    node_count: usize,
    edge_count: usize,
    junctions: usize,
    ends: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaVectorize {
    config: VectorizeConfig,
    node_count: usize,
    initial_edges: usize,
    edge_count: usize,
    splits: usize,
    fallbacks: usize,
    floor_hits: usize,
    max_error: f32,
    paths: usize,
    closed_paths: usize,
    segments: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Vectorize(args) => run_vectorize(args),
        Command::Topology(args) => run_topology(args),
    }
}

fn run_vectorize(args: VectorizeArgs) -> Result<()> {
    let common = &args.common;
    let cfg = load_config(common.config.as_deref())?;
    let case_dir = prepare_case(common, "vectorize")?;
    let (gray, mask) = load_mask(&common.input, cfg.binarization_threshold, common.dark_ink)?;
    let widths = common.widths.as_deref().map(load_widths).transpose()?;

    let run = Vectorizer::new(cfg)
        .context("validating vectorizer config")?
        .run_bitmap(&mask, widths, &IdentitySkeleton)
        .with_context(|| format!("vectorizing {}", common.input.display()))?;

    let svg = render_svg(&run.drawing, args.markers);
    fs::write(case_dir.join("drawing.svg"), svg)
        .with_context(|| format!("writing {}", case_dir.join("drawing.svg").display()))?;

    render_overlay(&gray, &run.drawing)
        .save(case_dir.join("overlay.png"))
        .with_context(|| format!("saving {}", case_dir.join("overlay.png").display()))?;

    write_json(case_dir.join("graph.json"), &graph_dto(&run))?;

    let stats = run.refined.stats;
    let drawing = &run.drawing;
    write_json(
        case_dir.join("meta.json"),
        &MetaVectorize {
            config: cfg,
            node_count: run.refined.graph.num_nodes(),
            initial_edges: stats.initial_edges,
            edge_count: run.refined.graph.num_edges(),
            splits: stats.splits,
            fallbacks: stats.fallbacks,
            floor_hits: stats.floor_hits,
            max_error: run.refined.max_error(),
            paths: drawing.paths.len(),
            closed_paths: drawing.paths.iter().filter(|p| p.closed).count(),
            segments: drawing.num_segments(),
        },
    )?;

    info!("wrote {}", case_dir.display());
    Ok(())
}

fn run_topology(args: CommonArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let case_dir = prepare_case(&args, "topology")?;
    let (_, mask) = load_mask(&args.input, cfg.binarization_threshold, args.dark_ink)?;
    let pixels = match args.widths.as_deref().map(load_widths).transpose()? {
        Some(w) => PixelGraph::new(mask, w).context("pairing skeleton and width images")?,
        None => PixelGraph::from_mask(mask),
    };
    let graph = build_graph(&pixels)
        .with_context(|| format!("building topology of {}", args.input.display()))?;

    write_json(
        case_dir.join("graph.json"),
        &GraphDto {
            width: graph.width,
            height: graph.height,
            nodes: node_dtos(&graph),
            edges: graph
                .live_edges()
                .map(|e| GraphEdgeDto {
                    id: e.id,
                    a: e.a,
                    b: e.b,
                    is_loop: e.is_loop(),
                    pixels: e.pixels.iter().map(|&(x, y)| [x, y]).collect(),
                    curve: None,
                })
                .collect(),
            super_edges: Vec::new(),
        },
    )?;

    write_json(
        case_dir.join("meta.json"),
        &MetaTopology {
            node_count: graph.num_nodes(),
            edge_count: graph.num_edges(),
            junctions: graph.num_junctions(),
            ends: graph.num_ends(),
        },
    )?;

    Ok(())
}

fn graph_dto(run: &Vectorization) -> GraphDto {
    let graph = &run.refined.graph;
    let edges = graph
        .live_edges()
        .map(|e| GraphEdgeDto {
            id: e.id,
            a: e.a,
            b: e.b,
            is_loop: e.is_loop(),
            pixels: e.pixels.iter().map(|&(x, y)| [x, y]).collect(),
            curve: run.refined.curve(e.id).map(|c| CurveDto {
                control_points: c.bezier.control_points().map(|p| [p.x, p.y]),
                error: c.error,
                fallback: c.fallback,
            }),
        })
        .collect();
    let super_edges = run
        .hypergraph
        .iter()
        .map(|(id, s)| SuperEdgeDto {
            id,
            nodes: s.nodes().to_vec(),
            edges: s.edges().to_vec(),
            closed: s.is_closed(),
        })
        .collect();

    GraphDto {
        width: graph.width,
        height: graph.height,
        nodes: node_dtos(graph),
        edges,
        super_edges,
    }
}

fn node_dtos(graph: &TopologicalGraph) -> Vec<GraphNodeDto> {
    graph
        .nodes()
        .iter()
        .map(|n| GraphNodeDto {
            id: n.id,
            kind: node_kind_name(n.kind),
            x: n.anchor.x,
            y: n.anchor.y,
            degree: graph.node_degree(n.id),
            pixels: n.pixels.len(),
        })
        .collect()
}

/// One `<path>` per stroke, in pixel-center coordinates.
fn render_svg(drawing: &VectorDrawing, markers: bool) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = drawing.width,
        h = drawing.height
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<g fill="none" stroke="black" stroke-width="1" stroke-linecap="round" stroke-linejoin="round">"#
    );
    for path in &drawing.paths {
        let Some(first) = path.segments.first() else {
            continue;
        };
        let mut d = String::new();
        let (x, y) = svg_xy(first.p0);
        let _ = write!(d, "M{x:.2} {y:.2}");
        for seg in &path.segments {
            push_cubic(&mut d, seg);
        }
        if path.closed {
            d.push_str(" Z");
        }
        let _ = writeln!(svg, r#"<path id="s{}" d="{d}"/>"#, path.super_edge);
    }
    let _ = writeln!(svg, "</g>");

    if markers {
        let _ = writeln!(svg, r#"<g stroke="none">"#);
        for m in &drawing.markers {
            let (x, y) = svg_xy(m.anchor);
            let _ = writeln!(
                svg,
                r#"<circle cx="{x:.2}" cy="{y:.2}" r="0.6" fill="{}"/>"#,
                marker_color(m.kind)
            );
        }
        let _ = writeln!(svg, "</g>");
    }
    let _ = writeln!(svg, "</svg>");
    svg
}

fn push_cubic(d: &mut String, seg: &CubicBezier) {
    let (x1, y1) = svg_xy(seg.p1);
    let (x2, y2) = svg_xy(seg.p2);
    let (x3, y3) = svg_xy(seg.p3);
    let _ = write!(d, " C{x1:.2} {y1:.2} {x2:.2} {y2:.2} {x3:.2} {y3:.2}");
}

fn svg_xy(p: Point2f) -> (f32, f32) {
    (p.x + 0.5, p.y + 0.5)
}

fn marker_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Junction => "#d62728",
        NodeKind::Corner => "#ff7f0e",
        NodeKind::End => "#1f77b4",
        NodeKind::LoopAnchor => "#9467bd",
        NodeKind::Split => "#2ca02c",
        NodeKind::Isolated => "#7f7f7f",
    }
}

/// Samples every segment onto the input image.
fn render_overlay(input: &GrayImage, drawing: &VectorDrawing) -> RgbImage {
    let mut rgb = image::DynamicImage::ImageLuma8(input.clone()).to_rgb8();
    for path in &drawing.paths {
        for seg in &path.segments {
            let steps = (seg.p0.distance(seg.p3).ceil() as usize * 2).max(8);
            for i in 0..=steps {
                let p = seg.eval(i as f32 / steps as f32);
                put(&mut rgb, p, Rgb([255, 64, 64]));
            }
        }
    }
    for m in &drawing.markers {
        put(&mut rgb, m.anchor, Rgb([64, 160, 255]));
    }
    rgb
}

fn put(img: &mut RgbImage, p: Point2f, color: Rgb<u8>) {
    let (xi, yi) = (p.x.round() as i64, p.y.round() as i64);
    if xi < 0 || yi < 0 {
        return;
    }
    let (ux, uy) = (xi as u32, yi as u32);
    if ux < img.width() && uy < img.height() {
        img.put_pixel(ux, uy, color);
    }
}

fn load_config(path: Option<&Path>) -> Result<VectorizeConfig> {
    match path {
        Some(p) => {
            ensure_file_exists(p, "config")?;
            read_json(p)
        }
        None => Ok(VectorizeConfig::default()),
    }
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;
    if let Some(w) = &common.widths {
        ensure_file_exists(w, "widths")?;
    }

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;

    Ok(case_dir)
}

fn load_gray(path: &Path) -> Result<GrayImage> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening image {}", path.display()))?;
    Ok(dyn_img.to_luma8())
}

fn load_mask(path: &Path, threshold: u8, dark_ink: bool) -> Result<(GrayImage, Raster<bool>)> {
    let gray = load_gray(path)?;
    let (w, h) = gray.dimensions();
    let data = gray
        .as_raw()
        .iter()
        .map(|&v| (v >= threshold) != dark_ink)
        .collect();
    let mask = Raster::from_vec(w as usize, h as usize, data)
        .with_context(|| format!("constructing skeleton mask from {}", path.display()))?;
    if mask.count_set() == 0 {
        bail!("no skeleton pixels in {} at threshold {threshold}", path.display());
    }
    Ok((gray, mask))
}

fn load_widths(path: &Path) -> Result<Raster<u32>> {
    let gray = load_gray(path)?;
    let (w, h) = gray.dimensions();
    let data = gray.into_raw().into_iter().map(u32::from).collect();
    Raster::from_vec(w as usize, h as usize, data)
        .with_context(|| format!("constructing width raster from {}", path.display()))
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn node_kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::End => "End",
        NodeKind::Junction => "Junction",
        NodeKind::Isolated => "Isolated",
        NodeKind::Corner => "Corner",
        NodeKind::LoopAnchor => "LoopAnchor",
        NodeKind::Split => "Split",
    }
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
