//! Dump decoder calls of an IconVG file and optionally convert it to SVG
use iconvg::*;
use std::{
    env,
    fs::File,
    io::{BufWriter, Read, Write},
};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    svg_file: Option<String>,
    size: Scalar,
    prefix: String,
    cubics_only: bool,
    json: bool,
    quiet: bool,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            svg_file: None,
            size: 64.0,
            prefix: String::new(),
            cubics_only: false,
            json: false,
            quiet: false,
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "ivg_dump".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-s" => {
                    let size: Scalar = args.next().ok_or("-s requires argument")?.parse()?;
                    if size <= 0.0 {
                        return Err("size must be positive".into());
                    }
                    result.size = size;
                }
                "-p" => {
                    result.prefix = args.next().ok_or("-p requires argument")?;
                }
                "-svg" => {
                    result.svg_file = Some(args.next().ok_or("-svg requires argument")?);
                }
                "-c" => result.cubics_only = true,
                "-j" => result.json = true,
                "-q" => result.quiet = true,
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        _ => return Err("unexpected positional argment".into()),
                    }
                }
            }
        }
        if positional < 1 {
            eprintln!("Dump decoder calls of an IconVG file and optionally convert it to SVG");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-s <size>] [-p <prefix>] [-svg <out.svg>] [-c] [-j] [-q] <file.ivg>",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -s <size>          size of the destination square (default: 64)");
            eprintln!("    -p <prefix>        prefix of every logged call");
            eprintln!("    -svg <out.svg>     write drawings as SVG document ('-' means stdout)");
            eprintln!("    -c                 convert quads and arcs to cubic curves");
            eprintln!("    -j                 print recorded drawings as JSON");
            eprintln!("    -q                 do not log decoder calls");
            eprintln!("    <file.ivg>         IconVG file ('-' means stdin)");
            std::process::exit(1);
        }
        Ok(result)
    }
}

fn load(path: &str) -> Result<Vec<u8>, Error> {
    let mut contents = Vec::new();
    if path != "-" {
        File::open(path)?.read_to_end(&mut contents)?;
    } else {
        std::io::stdin().read_to_end(&mut contents)?;
    }
    Ok(contents)
}

fn svg_fill(paint: &RecordedPaint) -> String {
    match paint {
        RecordedPaint::Flat(color) => {
            let [r, g, b, a] = color.to_nonpremul();
            format!(
                "fill=\"#{:02x}{:02x}{:02x}\" fill-opacity=\"{:.3}\"",
                r,
                g,
                b,
                a as f32 / 255.0
            )
        }
        RecordedPaint::Linear { stops, .. } | RecordedPaint::Radial { stops, .. } => {
            // gradients are approximated by their first stop
            let color = stops.first().map_or(RGBA::TRANSPARENT, |(_, color)| *color);
            svg_fill(&RecordedPaint::Flat(color))
        }
    }
}

fn write_svg(mut out: impl Write, recorder: &Recorder, size: Scalar) -> Result<(), Error> {
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\">",
        size
    )?;
    for drawing in recorder.drawings() {
        writeln!(
            out,
            "  <path {} d=\"{}\"/>",
            svg_fill(&drawing.paint),
            drawing.to_svg_path()
        )?;
    }
    writeln!(out, "</svg>")?;
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let bytes = tracing::debug_span!("[load]").in_scope(|| load(&args.input_file))?;
    let viewbox = decode_viewbox(&bytes)?;
    tracing::debug!("[viewbox] {}", viewbox);

    let options = RecorderOptions::default()
        .with_cubics_only(args.cubics_only)
        .with_placeholder_for_invalid_paint(true);
    let mut recorder = Recorder::with_options(options);
    let sink = if args.quiet {
        None
    } else {
        Some(std::io::stdout().lock())
    };
    let dst = Rectangle::new(0.0, 0.0, args.size, args.size);
    {
        let mut canvas = DebugCanvas::new(
            sink,
            args.prefix.as_str(),
            Some(&mut recorder as &mut dyn Canvas),
        );
        decode(&mut canvas, dst, &bytes, &DecodeOptions::default())?;
    }
    tracing::debug!("[drawings] {}", recorder.drawings().len());

    if args.json {
        let json = recorder.to_json()?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    }

    if let Some(svg_file) = args.svg_file {
        let _save = tracing::debug_span!("[save]").entered();
        if svg_file != "-" {
            write_svg(BufWriter::new(File::create(svg_file)?), &recorder, args.size)?;
        } else {
            write_svg(std::io::stdout().lock(), &recorder, args.size)?;
        }
    }

    Ok(())
}
