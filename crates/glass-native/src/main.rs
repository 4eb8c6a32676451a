use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use glam::DVec2;

use glass_core::constants::FALLBACK_FRAME_MS;
use glass_core::{
    generate_field, BoundingBox, ExclusiveSession, FieldCache, FilterGraph, GlassConfig,
    GlassEffect, ManualFrames, MeasureMode, OverlayLayout, PointerInput, ShapeParams, Surface,
};

#[derive(Parser, Debug)]
#[command(name = "glass-native", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize a displacement field to a PNG.
    Field(FieldArgs),
    /// Mount an effect on a virtual element and write what it applies.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FieldArgs {
    #[arg(long)]
    width: f64,
    #[arg(long)]
    height: f64,
    #[arg(long, default_value_t = 0.15, allow_hyphen_values = true)]
    intensity: f64,
    #[arg(long, default_value_t = 0.6, allow_hyphen_values = true)]
    roundness: f64,
    #[arg(long, default_value_t = 0.3, allow_hyphen_values = true)]
    shape_width: f64,
    #[arg(long, default_value_t = 0.2, allow_hyphen_values = true)]
    shape_height: f64,
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    depth: f64,
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Effect config JSON (camelCase keys, missing keys take defaults).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Size of the virtual content element.
    #[arg(long, default_value_t = 300.0)]
    width: f64,
    #[arg(long, default_value_t = 200.0)]
    height: f64,
    #[arg(long, default_value_t = 0.0)]
    left: f64,
    #[arg(long, default_value_t = 0.0)]
    top: f64,
    /// Drag the overlay to `x,y` before writing (draggable configs only).
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    drag_to: Option<DVec2>,
    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,
}

fn parse_point(s: &str) -> Result<DVec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{}'", s))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("x: {}", e))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("y: {}", e))?;
    Ok(DVec2::new(x, y))
}

/// In-memory surface: a fixed-size virtual element that records the last
/// state applied to it.
#[derive(Default)]
struct SnapshotSurface {
    bounds: BoundingBox,
    graph: Option<FilterGraph>,
    source: Option<(String, f64, f64)>,
    scale: f64,
    layout: Option<OverlayLayout>,
    backdrop: String,
}

impl Surface for SnapshotSurface {
    fn measure(&self, mode: MeasureMode) -> Option<BoundingBox> {
        match mode {
            MeasureMode::Inline => Some(self.bounds),
            MeasureMode::Floating => Some(BoundingBox {
                left: 0.0,
                top: 0.0,
                ..self.bounds
            }),
        }
    }

    fn attach_filter(&mut self, graph: &FilterGraph) -> glass_core::Result<()> {
        self.graph = Some(graph.clone());
        self.source = None;
        Ok(())
    }

    fn set_displacement_source(&mut self, data_uri: &str, width: f64, height: f64) -> glass_core::Result<()> {
        self.source = Some((data_uri.to_string(), width, height));
        Ok(())
    }

    fn set_displacement_scale(&mut self, scale: f64) -> glass_core::Result<()> {
        self.scale = scale;
        Ok(())
    }

    fn apply_layout(&mut self, layout: &OverlayLayout) -> glass_core::Result<()> {
        self.layout = Some(layout.clone());
        Ok(())
    }

    fn apply_backdrop_filter(&mut self, filter: &str) -> glass_core::Result<()> {
        self.backdrop = filter.to_string();
        Ok(())
    }
}

type HeadlessEffect = GlassEffect<SnapshotSurface, ManualFrames>;

// Advance one frame tick: due timers first, then frames.
fn tick(effect: &mut HeadlessEffect) {
    let due = effect
        .frames_mut()
        .advance(Duration::from_millis(FALLBACK_FRAME_MS));
    for token in due {
        if let Some(p) = effect.on_timer(token) {
            log::info!("[native] position settled at ({:.1},{:.1})", p.x, p.y);
        }
    }
    let frames = effect.frames_mut().take_frames();
    for token in frames {
        effect.on_frame(token);
    }
}

fn settle(effect: &mut HeadlessEffect) {
    while effect.frames().pending_frames() > 0 || effect.frames().pending_timers() > 0 {
        tick(effect);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Field(args) => cmd_field(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_field(args: FieldArgs) -> anyhow::Result<()> {
    let shape = ShapeParams {
        intensity: args.intensity,
        roundness: args.roundness,
        shape_width: args.shape_width,
        shape_height: args.shape_height,
        depth: args.depth,
    };
    let field = generate_field(args.width, args.height, &shape);
    if field.is_degenerate() {
        log::warn!(
            "[native] {}x{} produced the neutral field",
            args.width,
            args.height
        );
    }
    let png = field.to_png()?;
    ensure_parent(&args.out)?;
    std::fs::write(&args.out, png).with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({}x{}, max scale {:.4})",
        args.out.display(),
        field.width,
        field.height,
        field.max_scale
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            GlassConfig::from_json(&json)?
        }
        None => GlassConfig::default(),
    };
    let surface = SnapshotSurface {
        bounds: BoundingBox {
            width: args.width,
            height: args.height,
            left: args.left,
            top: args.top,
        },
        ..SnapshotSurface::default()
    };
    let cache = Rc::new(RefCell::new(FieldCache::default()));
    let mut effect = GlassEffect::new("vaso0", config, surface, ManualFrames::new(), cache.clone());
    effect.mount();
    settle(&mut effect);

    if let Some(target) = args.drag_to {
        let mut session = ExclusiveSession::default();
        let start = effect.position();
        effect.pointer_down(PointerInput::new(1, start.x, start.y), &mut session);
        effect.pointer_move(PointerInput::new(1, target.x, target.y));
        tick(&mut effect);
        effect.pointer_up(PointerInput::new(1, target.x, target.y), &mut session);
        settle(&mut effect);
    }

    let Some(applied) = effect.recompute()? else {
        anyhow::bail!("surface reported as unmounted");
    };
    let surface = effect.surface();
    let (href, width, height) = surface
        .source
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no displacement source applied"))?;
    let graph = surface
        .graph
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no filter graph applied"))?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let field_path = args.out_dir.join("field.png");
    std::fs::write(&field_path, applied.field.to_png()?)
        .with_context(|| format!("write png '{}'", field_path.display()))?;

    let svg_path = args.out_dir.join("filter.svg");
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="0"><defs>{}</defs></svg>"#,
        graph.to_svg(Some(href.as_str()), width, height, surface.scale)
    );
    std::fs::write(&svg_path, svg).with_context(|| format!("write svg '{}'", svg_path.display()))?;

    let layout = surface.layout.as_ref();
    let cache_stats = cache.borrow().stats();
    let stats = effect.stats();
    let summary = serde_json::json!({
        "id": effect.id(),
        "position": { "x": effect.position().x, "y": effect.position().y },
        "box": { "width": applied.effect_box.width, "height": applied.effect_box.height },
        "raster": { "width": applied.field.width, "height": applied.field.height },
        "maxScale": applied.field.max_scale,
        "displacementScale": surface.scale,
        "backdropFilter": surface.backdrop,
        "layout": layout.map(|l| serde_json::json!({
            "left": l.left,
            "top": l.top,
            "width": l.width,
            "height": l.height,
            "fixed": l.fixed,
            "borderRadius": l.border_radius,
            "boxShadow": l.box_shadow,
            "cursor": l.cursor.as_css(),
        })),
        "stats": {
            "recomputes": stats.recomputes,
            "failures": stats.failures,
            "skipped": stats.skipped,
            "cacheHits": cache_stats.hits,
            "cacheMisses": cache_stats.misses,
        },
    });
    let summary_path = args.out_dir.join("effect.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("write summary '{}'", summary_path.display()))?;

    log::info!(
        "[native] {} applied in {:?}; wrote {}",
        effect.id(),
        applied.elapsed,
        args.out_dir.display()
    );
    Ok(())
}
