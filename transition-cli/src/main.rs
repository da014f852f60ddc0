//! # Transition CLI
//!
//! 场景过渡 headless 驱动 - 用模拟协作者跑完整过渡流程，或检查配置文件。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p transition-cli -- run --scene Level2
//! cargo run -p transition-cli -- run --config transitions.json --scene Level2 --seed 7 -v
//! cargo run -p transition-cli -- check transitions.json
//! cargo run -p transition-cli -- sample-config > transitions.json
//! ```

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use transition_core::{
    FadeTarget, Layer, SceneTransitionOrchestrator, SimulatedSceneLoader, SoundTrigger,
    TransitionAnimator, TransitionConfig, TransitionEvent, TransitionPhase,
};

#[derive(Parser)]
#[command(name = "transition")]
#[command(about = "场景过渡 headless 驱动")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 日志详细程度（-v: info, -vv: debug, -vvv: trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 用模拟协作者跑一次完整过渡
    Run(RunArgs),

    /// 加载并验证配置文件
    Check {
        /// 配置文件路径
        config: PathBuf,
    },

    /// 输出参考配置
    SampleConfig {
        /// 写入文件（默认输出到 stdout）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// 配置文件（默认使用参考配置）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 目标场景
    #[arg(short, long, default_value = "Level2")]
    scene: String,

    /// 每个 tick 的时长（秒）
    #[arg(long, default_value = "0.016")]
    dt: f32,

    /// 动画触发后多久发出 proceed 信号（秒）
    #[arg(long, default_value = "0.5")]
    proceed_after: f32,

    /// 从不发出 proceed 信号（依赖配置中的兜底策略）
    #[arg(long)]
    no_signal: bool,

    /// 模拟加载速率（每秒进度）
    #[arg(long, default_value = "1.5")]
    load_rate: f32,

    /// 激活释放后到完成的延迟（秒）
    #[arg(long, default_value = "0.1")]
    activation_delay: f32,

    /// 随机种子（覆盖配置文件）
    #[arg(long)]
    seed: Option<u64>,

    /// 最大 tick 数，超过视为挂起
    #[arg(long, default_value = "100000")]
    max_ticks: u64,

    /// 不配置遮罩层
    #[arg(long)]
    no_cover: bool,

    /// 不配置过渡图层
    #[arg(long)]
    no_secondary: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run(&args),
        Commands::Check { config } => check(&config),
        Commands::SampleConfig { output } => sample_config(output.as_deref()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// 只记录日志的动画播放器
///
/// 触发后由驱动循环在 `proceed_after` 秒后模拟动画事件。
struct LoggingAnimator {
    clip_length: Option<f32>,
}

impl TransitionAnimator for LoggingAnimator {
    fn set_integer(&mut self, name: &str, value: i32) {
        debug!(name, value, "animator.set_integer");
    }

    fn set_trigger(&mut self, name: &str) {
        debug!(name, "animator.set_trigger");
    }

    fn current_clip_length(&self) -> Option<f32> {
        self.clip_length
    }
}

#[derive(Default)]
struct CountingSound {
    played: Cell<u32>,
}

impl SoundTrigger for CountingSound {
    fn play(&self) {
        self.played.set(self.played.get() + 1);
        info!("♪ 过渡音效");
    }
}

fn run(args: &RunArgs) -> Result<()> {
    if !args.dt.is_finite() || args.dt <= 0.0 {
        bail!("--dt 必须大于 0，实际为 {}", args.dt);
    }

    let mut config = match &args.config {
        Some(path) => TransitionConfig::try_load(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => TransitionConfig::reference(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate().context("配置验证失败")?;

    let loader = SimulatedSceneLoader::new(args.load_rate)
        .with_ceiling(config.activation_ceiling)
        .with_activation_delay(args.activation_delay);
    let control = loader.control();

    let cover = Rc::new(Layer::transparent("cover"));
    let secondary = Rc::new(Layer::transparent("secondary"));
    let sound = Rc::new(CountingSound::default());

    let mut orchestrator = SceneTransitionOrchestrator::from_config(&config, loader)?
        .with_animator(LoggingAnimator {
            clip_length: Some(args.proceed_after),
        })
        .with_sound(sound.clone());
    if !args.no_cover {
        orchestrator = orchestrator.with_cover(cover.clone());
    }
    if !args.no_secondary {
        orchestrator = orchestrator.with_secondary(secondary.clone());
    }
    let hook = orchestrator.event_hook();
    let proceed_after = (!args.no_signal).then_some(args.proceed_after);

    println!("▶ 过渡到 '{}'", args.scene);
    orchestrator
        .try_start_transition(args.scene.as_str())
        .context("无法开始过渡")?;

    let mut elapsed = 0.0_f32;
    let mut ticks = 0_u64;
    let mut proceed_countdown: Option<f32> = None;
    let mut completed = false;

    loop {
        for event in orchestrator.take_events() {
            match &event {
                TransitionEvent::AnimatorTriggered { .. } => {
                    hook.play_transition_sound();
                    proceed_countdown = proceed_after;
                }
                TransitionEvent::Completed { .. } => completed = true,
                _ => {}
            }
            print_event(elapsed, &event);
        }

        if !orchestrator.is_active() {
            break;
        }
        if ticks >= args.max_ticks {
            bail!(
                "过渡在 {} 个 tick 后仍未结束，停在 {} 阶段",
                ticks,
                orchestrator.phase()
            );
        }

        if let Some(remaining) = proceed_countdown.as_mut() {
            *remaining -= args.dt;
            if *remaining <= 0.0 {
                proceed_countdown = None;
                hook.load_next_scene();
            }
        }

        orchestrator.update(args.dt);
        elapsed += args.dt;
        ticks += 1;

        if orchestrator.phase() == TransitionPhase::Loading {
            debug!(progress = ?control.progress(), "加载进度");
        }
    }

    println!(
        "■ {} | 用时 {:.3}s / {} ticks | 当前场景 {:?} | 音效 {} 次 | 遮罩 {:.2}",
        if completed { "完成" } else { "未完成" },
        elapsed,
        ticks,
        control.active_scene(),
        sound.played.get(),
        cover.opacity(),
    );

    if !completed {
        bail!("过渡未正常完成");
    }
    Ok(())
}

fn print_event(elapsed: f32, event: &TransitionEvent) {
    let line = match event {
        TransitionEvent::Started {
            scene_id,
            variant_index,
        } => format!("开始 scene={scene_id} variant={variant_index}"),
        TransitionEvent::PhaseChanged { from, to } => format!("{from} -> {to}"),
        TransitionEvent::StallInjected { seconds } => format!("模拟停顿 {seconds:.2}s"),
        TransitionEvent::AnimatorTriggered { variant_index } => {
            format!("触发动画 TransitionIndex={variant_index}")
        }
        TransitionEvent::ActivationReleased => "释放激活".to_string(),
        TransitionEvent::ProceedTimedOut { waited } => {
            format!("proceed 超时 ({waited:.2}s)，兜底继续")
        }
        TransitionEvent::Completed { scene_id } => format!("完成 scene={scene_id}"),
        TransitionEvent::Rejected { error } => format!("拒绝: {error}"),
        TransitionEvent::Aborted { error } => format!("中止: {error}"),
        TransitionEvent::Cancelled { scene_id } => format!("取消 scene={scene_id}"),
    };
    println!("[{elapsed:>7.3}s] {line}");
}

fn check(path: &Path) -> Result<()> {
    let config = TransitionConfig::try_load(path)
        .with_context(|| format!("无法加载配置文件 {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("配置验证失败: {}", path.display()))?;

    println!("✅ {} 有效", path.display());
    println!("   activation_ceiling: {}", config.activation_ceiling);
    println!(
        "   latency: {:.0}% / {:.2}s",
        config.latency.probability * 100.0,
        config.latency.seconds
    );
    println!("   proceed_fallback: {:?}", config.proceed_fallback);
    println!("   变体 ({}):", config.variants.len());
    for variant in &config.variants {
        println!(
            "     {:<12} appear {:.2}s  disappear {:.2}s{}",
            variant.label(),
            variant.cover_appear,
            variant.cover_disappear,
            if variant.needs_secondary_fade {
                "  +secondary"
            } else {
                ""
            }
        );
    }
    Ok(())
}

fn sample_config(output: Option<&Path>) -> Result<()> {
    let config = TransitionConfig::reference();
    match output {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("无法写入 {}", path.display()))?;
            println!("已写入 {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
    }
    Ok(())
}
