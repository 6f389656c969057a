use roomview::cli::{self, Args};
use roomview::config::{self, PathConfig, ViewerSettings};
use roomview::core::clock::AnimationClock;
use roomview::core::session::Session;
use roomview::entities::canvas::Canvas;
use roomview::entities::loader::{AssetLoader, FsLoader};
use roomview::entities::manifest::{find_room, load_rooms};
use roomview::entities::room::Room;
use roomview::entities::scene::Scene;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

fn init_logging(args: &Args, paths: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = match log_path_opt {
            Some(path) => path.clone(),
            None => paths.ensure_dir()?.join(config::LOG_FILE),
        };
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Respects RUST_LOG if set
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level.as_str()))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// Room from a room file, or from a manifest when `--room` is given.
fn load_room(loader: &impl AssetLoader, file: &str, room_id: Option<&str>) -> Result<Room> {
    let Some(room_id) = room_id else {
        let doc = loader.fetch_json(file)?;
        return Ok(Room::from_json(doc)?);
    };
    let rooms = load_rooms(loader, file)?;
    match find_room(&rooms, room_id) {
        Some(entry) => {
            info!("Room '{}' ({})", entry.room_id, entry.name);
            Ok(entry.room.clone())
        }
        None => {
            let known: Vec<&str> = rooms.iter().map(|r| r.room_id.as_str()).collect();
            bail!("room '{}' not in manifest (known: {})", room_id, known.join(", "))
        }
    }
}

fn print_table(scene: &Scene) {
    for row in scene.rows() {
        let fields: Vec<String> = row
            .fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, cli::format_value(value)))
            .collect();
        println!(
            "{:>2} {}{:<12} {:<8} {}",
            row.index,
            if row.immovable { '*' } else { ' ' },
            row.name,
            row.kind.as_str(),
            fields.join(" ")
        );
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = PathConfig::from_env_and_cli(args.config_dir.clone());
    init_logging(&args, &paths)?;
    debug!("Command-line args: {:?}", args);

    let mut settings = ViewerSettings::load(&paths)?;
    if let Some(rate) = args.tick_rate {
        settings.tick_rate = rate;
    }
    if args.play {
        settings.playback = true;
    }
    if args.save_settings {
        let path = settings.save(&paths)?;
        info!("Settings saved to {}", path.display());
    }

    // Asset URLs resolve next to the room file
    let root = match args.source.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => settings.asset_root.clone(),
    };
    let file_name = args
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", args.source.display()))?;
    let loader = FsLoader::new(root);
    info!("Asset root: {}", loader.root().display());

    let room = load_room(&loader, &file_name, args.room.as_deref())?;
    let clock = AnimationClock::new(settings.tick_rate);
    let mut session = Session::new(loader, Canvas::default(), Canvas::default())
        .with_clock(clock)
        .with_preview_max(settings.preview_max);
    session.switch_room(&room)?;
    session.set_playing(settings.playback);

    for &index in &args.show {
        let visible = session.toggle_visible(index)?;
        info!("Layer {} visible={}", index, visible);
    }
    for edit in &args.set {
        session
            .edit_field_text(edit.index, &edit.field, &edit.value)
            .with_context(|| format!("--set {}.{}={}", edit.index, edit.field, edit.value))?;
    }
    if let Some(order) = &args.order {
        session.reorder_rows(order).context("--order")?;
    }

    if session.clock().is_playing() {
        // Real-time playback for N ticks
        let mut fired = 0;
        while fired < args.ticks {
            if session.update(Instant::now())?.is_some() {
                fired += 1;
            }
            std::thread::sleep(session.clock().interval() / 4);
        }
    } else {
        for _ in 0..args.ticks {
            session.step()?;
        }
    }

    if args.list {
        if let Some(scene) = session.scene() {
            print_table(scene);
        }
    }

    if let Some(index) = args.preview {
        session.set_preview(Some(index))?;
        if let Some(out) = &args.preview_out {
            save(session.preview_surface(), out)?;
        }
    }

    if let Some(out) = &args.out {
        save(session.surface(), out)?;
    }

    let stats = session.cache_stats();
    info!(
        "Done: {} image lookups, {:.0}% cache hits",
        stats.total(),
        stats.hit_rate() * 100.0
    );
    Ok(())
}

fn save(canvas: &Canvas, out: &Path) -> Result<()> {
    if canvas.width() == 0 || canvas.height() == 0 {
        bail!("Nothing rendered, not writing {}", out.display());
    }
    canvas.save(out)?;
    println!("{}", out.display());
    Ok(())
}
