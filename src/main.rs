use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use colorcube::cli::Args;
use colorcube::pipeline::select::select_count;
use colorcube::pipeline::source::load_image;
use colorcube::pipeline::ExtractSettings;
use colorcube::theme::ThemeFile;
use colorcube::tui::{self, TuiApp};
use colorcube::{ColorCube, SelectionPolicy, Theme};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let settings = args.settings()?;
    let theme = Theme::from(args.mode);

    if args.tui {
        return tui::run(TuiApp::new(args.images.clone(), theme), settings);
    }
    if args.output.is_some() && args.images.len() > 1 {
        bail!("--output takes a single image, got {}", args.images.len());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, path) in args.images.iter().enumerate() {
        if args.images.len() > 1 {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "# {}", path.display())?;
        }
        let cube = build_cube(path, &settings)?;

        if let Some(flags) = args.selection_flags()? {
            let avoid = args.avoid_color()?;
            let count = args.colors.unwrap_or(usize::MAX);
            let selection = &settings.policy.selection;
            for color in select_count(&cube, flags, avoid, selection, count) {
                writeln!(out, "{color}")?;
            }
            continue;
        }

        let scheme = SelectionPolicy::new(settings.policy).run(&cube, theme);
        if args.preview {
            colorcube::preview::render(&mut out, &scheme)?;
        }
        let theme_file = ThemeFile::from_scheme(scheme);
        match &args.output {
            Some(output) => {
                theme_file.write_to(output)?;
                eprintln!("wrote {}", output.display());
            }
            None => out.write_all(theme_file.serialize().as_bytes())?,
        }
    }
    Ok(())
}

fn build_cube(path: &Path, settings: &ExtractSettings) -> Result<ColorCube> {
    let image = load_image(path, settings.max_dim)?;
    ColorCube::build(&image, &settings.cube)
        .with_context(|| format!("failed to scan {}", path.display()))
}
