// ============================================================================
// PAINTBOX CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   paintbox --input photo.png --op rotate=90 --output result.png
//   paintbox -i photo.jpg --op scale=800x600 --op invert -o out.png
//   paintbox -i a.png b.png c.png --op flip=h --output-dir processed/
//
// Operations run in the order given, through the same editor facade a GUI
// shell drives, so history bookkeeping and fill semantics match interactive
// use exactly.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::Rgba;

use crate::canvas::Surface;
use crate::components::tools::Editor;
use crate::io::{load_image, save_image};
use crate::ops::transform::FlipAxis;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Paintbox headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "paintbox",
    about = "Paintbox headless batch image processor",
    long_about = "Apply a sequence of canvas operations to image files without a GUI.\n\
                  Supported formats: PNG, JPEG, BMP (plus GIF/TIFF/ICO input).\n\n\
                  Operations (applied in order):\n  \
                  resize=WxH    change canvas size, content anchored top-left\n  \
                  scale=WxH     stretch content to the new size\n  \
                  rotate=DEG    rotate about the center (clockwise degrees)\n  \
                  flip=h|v      mirror horizontally or vertically\n  \
                  skew=H,V      shear by horizontal/vertical degrees\n  \
                  invert        invert RGB channels\n  \
                  fill=X,Y,#RRGGBB  flood fill starting at (X, Y)\n\n\
                  Example:\n  \
                  paintbox -i photo.png --op rotate=90 --op invert -o out.png"
)]
pub struct CliArgs {
    /// Input file(s).
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Operation to apply, repeatable; see --help for the syntax.
    #[arg(long = "op", value_name = "OP")]
    pub ops: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files keep their names.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Operation parsing
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
enum BatchOp {
    Resize(u32, u32),
    Scale(u32, u32),
    Rotate(f32),
    Flip(FlipAxis),
    Skew(f32, f32),
    Invert,
    Fill(i32, i32, Rgba<u8>),
}

fn parse_dims(val: &str) -> Result<(u32, u32), String> {
    let (w, h) = val
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{val}'"))?;
    let w = w.parse().map_err(|_| format!("bad width '{w}'"))?;
    let h = h.parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok((w, h))
}

fn parse_color(val: &str) -> Result<Rgba<u8>, String> {
    let hex = val.strip_prefix('#').unwrap_or(val);
    if hex.len() != 6 {
        return Err(format!("expected #RRGGBB, got '{val}'"));
    }
    let n = u32::from_str_radix(hex, 16).map_err(|_| format!("bad hex color '{val}'"))?;
    Ok(Rgba([(n >> 16) as u8, (n >> 8) as u8, n as u8, 255]))
}

fn parse_op(raw: &str) -> Result<BatchOp, String> {
    let (name, val) = match raw.split_once('=') {
        Some((n, v)) => (n, v),
        None => (raw, ""),
    };
    match name {
        "resize" => parse_dims(val).map(|(w, h)| BatchOp::Resize(w, h)),
        "scale" => parse_dims(val).map(|(w, h)| BatchOp::Scale(w, h)),
        "rotate" => val
            .parse()
            .map(BatchOp::Rotate)
            .map_err(|_| format!("bad angle '{val}'")),
        "flip" => match val {
            "h" | "horizontal" => Ok(BatchOp::Flip(FlipAxis::Horizontal)),
            "v" | "vertical" => Ok(BatchOp::Flip(FlipAxis::Vertical)),
            other => Err(format!("flip takes h or v, got '{other}'")),
        },
        "skew" => {
            let (h, v) = val
                .split_once(',')
                .ok_or_else(|| format!("expected H,V degrees, got '{val}'"))?;
            let h = h.parse().map_err(|_| format!("bad angle '{h}'"))?;
            let v = v.parse().map_err(|_| format!("bad angle '{v}'"))?;
            Ok(BatchOp::Skew(h, v))
        }
        "invert" => Ok(BatchOp::Invert),
        "fill" => {
            let parts: Vec<&str> = val.split(',').collect();
            if parts.len() != 3 {
                return Err(format!("expected X,Y,#RRGGBB, got '{val}'"));
            }
            let x = parts[0].parse().map_err(|_| format!("bad x '{}'", parts[0]))?;
            let y = parts[1].parse().map_err(|_| format!("bad y '{}'", parts[1]))?;
            let color = parse_color(parts[2])?;
            Ok(BatchOp::Fill(x, y, color))
        }
        other => Err(format!("unknown operation '{other}'")),
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    if args.input.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir for batch processing.",
            args.input.len()
        );
        return ExitCode::FAILURE;
    }

    let ops = match args.ops.iter().map(|s| parse_op(s)).collect::<Result<Vec<_>, _>>() {
        Ok(ops) => ops,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0usize;
    for input in &args.input {
        let started = Instant::now();
        let output = match output_path(input, args.output.as_deref(), args.output_dir.as_deref()) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {}: {e}", input.display());
                failures += 1;
                continue;
            }
        };
        match process_file(input, &output, &ops) {
            Ok(()) => {
                if args.verbose {
                    println!(
                        "{} -> {} ({} ops, {:.1?})",
                        input.display(),
                        output.display(),
                        ops.len(),
                        started.elapsed()
                    );
                }
            }
            Err(e) => {
                eprintln!("error: {}: {e}", input.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} file(s) failed.");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<PathBuf, String> {
    if let Some(dir) = output_dir {
        let name = input
            .file_name()
            .ok_or_else(|| "input has no file name".to_string())?;
        return Ok(dir.join(name));
    }
    if let Some(out) = output {
        return Ok(out.to_path_buf());
    }
    Err("no --output or --output-dir given".to_string())
}

fn process_file(input: &Path, output: &Path, ops: &[BatchOp]) -> Result<(), String> {
    let img = load_image(input).map_err(|e| e.to_string())?;
    let mut editor = Editor::from_surface(Surface::from_image(img));
    for op in ops {
        apply_op(&mut editor, op);
    }
    save_image(editor.surface.image(), output).map_err(|e| e.to_string())
}

fn apply_op(editor: &mut Editor, op: &BatchOp) {
    match *op {
        BatchOp::Resize(w, h) => editor.resize(w, h),
        BatchOp::Scale(w, h) => editor.scale(w, h),
        BatchOp::Rotate(deg) => editor.rotate(deg),
        BatchOp::Flip(axis) => editor.flip(axis),
        BatchOp::Skew(h, v) => editor.skew(h, v),
        BatchOp::Invert => editor.invert(),
        BatchOp::Fill(x, y, color) => {
            editor.history.save_state(&editor.surface);
            let filled = editor.surface.flood_fill(x, y, color);
            log::debug!("fill at ({x},{y}): {filled} pixels");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_syntax_parses() {
        assert_eq!(parse_op("resize=800x600").unwrap(), BatchOp::Resize(800, 600));
        assert_eq!(parse_op("rotate=90").unwrap(), BatchOp::Rotate(90.0));
        assert_eq!(parse_op("flip=h").unwrap(), BatchOp::Flip(FlipAxis::Horizontal));
        assert_eq!(parse_op("invert").unwrap(), BatchOp::Invert);
        assert_eq!(
            parse_op("fill=3,4,#ff0000").unwrap(),
            BatchOp::Fill(3, 4, Rgba([255, 0, 0, 255]))
        );
    }

    #[test]
    fn bad_op_syntax_is_rejected()  {
        assert!(parse_op("rotate=ninety").is_err());
        assert!(parse_op("flip=z").is_err());
        assert!(parse_op("sharpen").is_err());
        assert!(parse_op("fill=1,2").is_err());
    }
}
