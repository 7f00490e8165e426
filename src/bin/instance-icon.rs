//! Command-line preview of the instance icon configuration.
//!
//! Resolves the configuration of a workspace exactly as the plugin would,
//! prints it, renders the icon set to PNG files and edits the stored
//! preferences.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use instance_icon::{
    BundledResources, ColorTriple, ConfigResolver, IconManager, IconPrecedence, InstanceContext,
    OverlaySpec, PreferenceStore, Preferences, PredefinedTheme, Result, SystemProperties,
};

#[derive(Debug, Parser)]
#[command(
    name = "instance-icon",
    about = "Preview and configure per-instance workbench icons and titles",
    version
)]
struct Cli {
    /// Workspace directory whose preferences are used.
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Launcher property, as NAME=VALUE (repeatable).
    #[arg(short = 'D', value_name = "NAME=VALUE", global = true)]
    define: Vec<String>,

    /// Directory holding bundled icon resources.
    #[arg(long, global = true)]
    resources: Option<PathBuf>,

    /// Ignore the system property and environment icon overrides.
    #[arg(long, global = true)]
    preferences_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every configuration source and the active values.
    Show,

    /// Render the icon set to PNG files.
    Render(RenderArgs),

    /// Change stored preferences (requires --workspace).
    Set(SetArgs),

    /// List the predefined icon themes.
    Themes,
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Output directory.
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Also render a single preview of the custom colors at this size.
    #[arg(long)]
    preview: Option<u32>,
}

#[derive(Debug, Args)]
struct SetArgs {
    #[arg(long)]
    suffix: Option<String>,

    /// Predefined theme name; empty clears it.
    #[arg(long)]
    predefined: Option<String>,

    /// Custom icon file; empty clears it.
    #[arg(long)]
    icon_path: Option<PathBuf>,

    /// Colors as "R,G,B" or "#RRGGBB".
    #[arg(long)]
    primary: Option<String>,

    #[arg(long)]
    secondary: Option<String>,

    #[arg(long)]
    accent: Option<String>,

    /// Overlay text, up to four characters.
    #[arg(long)]
    text: Option<String>,

    #[arg(long)]
    text_color: Option<String>,

    /// Overlay height in percent of the icon width.
    #[arg(long)]
    text_size: Option<i64>,

    /// Use the custom colors when no theme or file is set.
    #[arg(long)]
    colors_enabled: Option<bool>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = build_context(&cli);

    match cli.command {
        Commands::Show => {
            println!("Workspace: {}", ctx.workspace_id());
            println!("{}", ConfigResolver::new(&ctx).describe());
            Ok(())
        }
        Commands::Render(args) => render(&ctx, &args),
        Commands::Set(args) => set(ctx, args),
        Commands::Themes => {
            for theme in PredefinedTheme::ALL {
                println!("{:<18} {}", theme.name(), theme.label());
            }
            Ok(())
        }
    }
}

fn build_context(cli: &Cli) -> InstanceContext {
    let properties = SystemProperties::from_args(cli.define.iter().map(|d| format!("-D{d}")));
    let mut ctx = match &cli.workspace {
        Some(workspace) => InstanceContext::for_workspace(workspace, std::iter::empty::<&str>()),
        None => InstanceContext::new(PreferenceStore::in_memory(Preferences::default())),
    }
    .with_properties(properties);

    if let Some(root) = &cli.resources {
        ctx = ctx.with_resources(Rc::new(BundledResources::with_root(root)));
    }
    if cli.preferences_only {
        ctx = ctx.with_precedence(IconPrecedence::PreferencesOnly);
    }
    ctx
}

fn render(ctx: &InstanceContext, args: &RenderArgs) -> Result<()> {
    let resolver = ConfigResolver::new(ctx);
    let spec = resolver.resolve_icon_spec();
    std::fs::create_dir_all(&args.out)?;

    let mut manager = IconManager::new(ctx.resources.clone());
    for image in manager.load_from_spec(&spec) {
        let path = args.out.join(format!("icon_{}.png", image.size()));
        image.data.save(&path)?;
        println!("wrote {}", path.display());
    }
    if manager.is_using_fallback() {
        println!("note: a fallback icon was used for {spec}");
    }

    if let Some(size) = args.preview {
        let prefs = ctx.preferences.get();
        let preview = manager.render_preview(
            size,
            prefs.primary(),
            prefs.secondary(),
            prefs.accent(),
            &prefs.overlay(),
        );
        match preview {
            Some(image) => {
                let path = args.out.join(format!("preview_{size}.png"));
                image.save(&path)?;
                println!("wrote {}", path.display());
            }
            None => println!("preview could not be rendered"),
        }
    }

    if let Some(suffix) = resolver.resolve_title_suffix() {
        println!("title suffix: {suffix}");
    }
    Ok(())
}

fn set(mut ctx: InstanceContext, args: SetArgs) -> Result<()> {
    if ctx.preferences.path().is_none() {
        return Err(instance_icon::Error::Host(
            "set needs --workspace to know where preferences are stored".into(),
        ));
    }

    let prefs = ctx.preferences.get_mut();
    if let Some(suffix) = args.suffix {
        prefs.title_suffix = suffix;
    }
    if let Some(name) = args.predefined {
        if !name.trim().is_empty() && PredefinedTheme::from_name(&name).is_none() {
            return Err(instance_icon::Error::UnknownTheme(name));
        }
        prefs.predefined_icon = name;
    }
    if let Some(path) = args.icon_path {
        prefs.icon_path = path.to_string_lossy().into_owned();
    }

    let color = |value: Option<String>, current: ColorTriple| {
        value.map_or(current, |v| {
            ColorTriple::from_hex(&v).unwrap_or_else(|| ColorTriple::parse_or(&v, current))
        })
    };
    let (primary, secondary, accent) = (
        color(args.primary, prefs.primary()),
        color(args.secondary, prefs.secondary()),
        color(args.accent, prefs.accent()),
    );
    prefs.set_colors(primary, secondary, accent);

    let overlay = prefs.overlay();
    let overlay = OverlaySpec::new(
        args.text.as_deref().unwrap_or(overlay.text()),
        color(args.text_color, overlay.color()),
        args.text_size.unwrap_or(overlay.size_percent() as i64),
    );
    prefs.set_overlay(&overlay);

    if let Some(enabled) = args.colors_enabled {
        prefs.colors_enabled = enabled;
    }

    ctx.preferences.save()?;
    println!("{}", ConfigResolver::new(&ctx).describe());
    Ok(())
}
