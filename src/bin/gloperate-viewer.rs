use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser;

use gloperate::{
    Canvas, ClearStage, Color, Environment, HeadlessContext, TextureLoadStage, TimerStage,
    Viewport,
};

/// Headless viewer: drives a demo pipeline for a fixed number of frames
/// against a software context and optionally writes the last frame as a
/// PNG.
#[derive(Parser, Debug)]
#[command(name = "gloperate-viewer", version)]
struct Cli {
    /// Number of frames to drive.
    #[arg(long, default_value_t = 60)]
    frames: u64,

    /// Frame width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Background color as `r,g,b` with channels in [0, 1].
    #[arg(long, default_value = "0.2,0.3,0.4")]
    background: String,

    /// Image file to load through the texture stage.
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Write the last rendered frame to this PNG path.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = Environment::new();
    let mut canvas = Canvas::new(&env);
    let mut ctx = HeadlessContext::new(&env, cli.width, cli.height);

    canvas.set_render_stage(Box::new(ClearStage::new(&env, "clear")), None)?;
    canvas
        .container_mut()
        .pipeline_mut()
        .add_stage(Box::new(TimerStage::new(&env, "timer")))?;
    canvas
        .container_mut()
        .pipeline()
        .connect_slots("time_delta", "timer.time_delta")?;

    if let Some(texture) = &cli.texture {
        let loader = TextureLoadStage::new(&env, "texture_load");
        loader.filename.set(texture.display().to_string());
        canvas
            .container_mut()
            .pipeline_mut()
            .add_stage(Box::new(loader))?;
    }

    canvas.init_context(&mut ctx)?;
    canvas.set_viewport(
        Viewport::with_size(f64::from(cli.width), f64::from(cli.height)),
        Viewport::with_size(f64::from(cli.width), f64::from(cli.height)),
    );
    canvas.set_background_color(parse_color(&cli.background)?);

    let target = ctx.default_framebuffer().clone();
    let mut rendered_frames = 0u64;
    let mut last_tick = Instant::now();
    for _ in 0..cli.frames {
        let now = Instant::now();
        canvas.update(now.duration_since(last_tick).as_secs_f32());
        last_tick = now;
        if canvas.take_redraw_request() {
            canvas.render(&mut ctx, &target)?;
            rendered_frames += 1;
        }
    }

    let timer_time = canvas
        .container()
        .pipeline()
        .resolve_slot("timer.virtual_time")?
        .get_variant();
    eprintln!(
        "drove {} update ticks, rendered {} frames, virtual time {:?}",
        cli.frames, rendered_frames, timer_time
    );

    if let Some(out) = &cli.out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        canvas.export_image(&target, out)?;
        eprintln!("wrote {}", out.display());
    }

    canvas.deinit_context(&mut ctx);
    Ok(())
}

fn parse_color(spec: &str) -> anyhow::Result<Color> {
    let channels: Vec<f32> = spec
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid color '{spec}'"))?;
    match channels.as_slice() {
        [r, g, b] => Ok(Color::new(*r, *g, *b)),
        _ => anyhow::bail!("color '{spec}' must have exactly three channels"),
    }
}
