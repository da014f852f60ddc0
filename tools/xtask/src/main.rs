//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 transition-core 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `config-check`: 检查过渡配置文件（解析、验证）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use transition_core::TransitionConfig;
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "transition-core", "--html"]);
            run("cargo llvm-cov -p transition-core --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除工具 crate，只看库与驱动
            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "--workspace", "--exclude", "xtask", "--html"]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "config-check" => {
            let path = args.next();
            config_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 transition-core 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  config-check    检查过渡配置文件

CONFIG-CHECK:
  cargo xtask config-check [path]

  不带参数：检查 configs/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - JSON 解析错误
    - 配置验证（变体时长、activation_ceiling、延迟概率、兜底时长）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-core      -> cargo xtask cov-core
  cargo config-check  -> cargo xtask config-check
"#
    );
}

//=============================================================================
// config-check 命令实现
//=============================================================================

/// 默认配置目录（相对于 workspace root）
const DEFAULT_CONFIG_DIR: &str = "configs";

/// 单个文件的检查结果
struct ConfigReport {
    path: PathBuf,
    outcome: Result<usize, String>,
}

/// 执行配置检查
fn config_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_config_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_CONFIG_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认配置目录不存在: {}\n请在 workspace 根目录运行，或指定配置路径",
                    dir.display()
                );
            }
            collect_config_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到配置文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个配置文件...\n", files.len());

    let reports: Vec<ConfigReport> = files.into_iter().map(check_config_file).collect();
    print_reports(&reports);

    if reports.iter().any(|r| r.outcome.is_err()) {
        anyhow::bail!("配置检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有 .json 文件
fn collect_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个配置文件，成功时返回变体数量
fn check_config_file(path: PathBuf) -> ConfigReport {
    let outcome = TransitionConfig::try_load(&path)
        .and_then(|config| {
            config.validate()?;
            Ok(config.variants.len())
        })
        .map_err(|e| e.to_string());
    ConfigReport { path, outcome }
}

/// 输出检查结果
fn print_reports(reports: &[ConfigReport]) {
    for report in reports {
        match &report.outcome {
            Ok(variants) => eprintln!("[OK]    {} ({} 个变体)", report.path.display(), variants),
            Err(e) => eprintln!("[ERROR] {}: {}", report.path.display(), e),
        }
    }

    let error_count = reports.iter().filter(|r| r.outcome.is_err()).count();

    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个配置文件", reports.len());
    if error_count > 0 {
        eprintln!("❌ {} 个错误", error_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
