use clap::Parser;
use std::path::PathBuf;

use crate::entities::attrs::AttrValue;

/// Room scene viewer: build, edit, animate and render a room to PNG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Room descriptor JSON, or a manifest JSON when used with --room
    #[arg(value_name = "FILE")]
    pub source: PathBuf,

    /// Room id to pick from the manifest's room list
    #[arg(short = 'r', long = "room", value_name = "ID")]
    pub room: Option<String>,

    /// Write the composite to this PNG
    #[arg(short = 'o', long = "out", value_name = "PNG")]
    pub out: Option<PathBuf>,

    /// Layer index to render into the preview surface
    #[arg(long = "preview", value_name = "INDEX", requires = "preview_out")]
    pub preview: Option<usize>,

    /// Write the preview surface to this PNG
    #[arg(long = "preview-out", value_name = "PNG")]
    pub preview_out: Option<PathBuf>,

    /// Manual animation ticks to run before rendering
    #[arg(short = 't', long = "ticks", value_name = "N", default_value_t = 0)]
    pub ticks: u32,

    /// Enable animation playback (overrides settings)
    #[arg(short = 'p', long = "play")]
    pub play: bool,

    /// Animation clock rate in ticks/second (overrides settings)
    #[arg(long = "tick-rate", value_name = "HZ")]
    pub tick_rate: Option<f32>,

    /// Toggle visibility of a layer (can be repeated)
    #[arg(short = 's', long = "show", value_name = "INDEX")]
    pub show: Vec<usize>,

    /// Field edit INDEX.FIELD=VALUE, e.g. 3.posX=12 (can be repeated)
    #[arg(long = "set", value_name = "EDIT", value_parser = parse_edit)]
    pub set: Vec<FieldEdit>,

    /// New order of the movable rows, e.g. 2,0,1
    #[arg(long = "order", value_name = "ROWS", value_delimiter = ',')]
    pub order: Option<Vec<usize>>,

    /// Print the layer table
    #[arg(long = "list")]
    pub list: bool,

    /// Save effective settings to the config dir
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Enable debug logging to file (default: roomview.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

/// One `--set` edit.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    pub index: usize,
    pub field: String,
    /// Raw text, parsed against the field's type when applied
    pub value: String,
}

/// Parse `INDEX.FIELD=VALUE`.
pub fn parse_edit(s: &str) -> Result<FieldEdit, String> {
    let (target, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX.FIELD=VALUE, got '{}'", s))?;
    let (index, field) = target
        .split_once('.')
        .ok_or_else(|| format!("expected INDEX.FIELD before '=', got '{}'", target))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid layer index '{}'", index))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok(FieldEdit {
        index,
        field: field.to_string(),
        value: value.trim().to_string(),
    })
}

/// Cell text for the layer table.
pub fn format_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Float(v) if v.fract() == 0.0 => format!("{}", *v as i64),
        AttrValue::Float(v) => format!("{:.2}", v),
        other => other.to_string(),
    }
}
