// Command-line front end.
//
// Subcommands map onto the file-level helpers: `encode` turns a payload
// into an `.hmx` container, `decode` recovers it, `inspect` reports the
// container and header without decompressing, and `config` prints build
// details.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::compress::CompressOptions;
use crate::fec::{CODEWORD_LEN, MAX_CORRECTABLE, MESSAGE_LEN};
use crate::io::{ContainerOptions, StoredMatrix, read_matrix, write_matrix};
use crate::matrix::{self, MAX_SIDE, MIN_SIDE, ModuleDepth};
use crate::metadata::{CURRENT_VERSION, ContentType};
use crate::pipeline::{self, DecodeOptions, EncodeOptions, NoProgress};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// HMQC matrix code encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "hmqc",
    version,
    about = "HMQC matrix code encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode a payload into an .hmx matrix container.
    Encode(EncodeArgs),
    /// Decode an .hmx matrix container back into its payload.
    Decode(DecodeArgs),
    /// Print container and header information.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TypeArg {
    Text,
    Image,
    Audio,
    Binary,
}

impl From<TypeArg> for ContentType {
    fn from(t: TypeArg) -> Self {
        match t {
            TypeArg::Text => ContentType::Text,
            TypeArg::Image => ContentType::Image,
            TypeArg::Audio => ContentType::Audio,
            TypeArg::Binary => ContentType::Binary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DepthArg {
    Color32,
    Reduced1,
    Reduced2,
    Reduced3,
    Reduced4,
}

impl From<DepthArg> for ModuleDepth {
    fn from(d: DepthArg) -> Self {
        match d {
            DepthArg::Color32 => ModuleDepth::Color32,
            DepthArg::Reduced1 => ModuleDepth::Reduced(1),
            DepthArg::Reduced2 => ModuleDepth::Reduced(2),
            DepthArg::Reduced3 => ModuleDepth::Reduced(3),
            DepthArg::Reduced4 => ModuleDepth::Reduced(4),
        }
    }
}

#[derive(Args, Debug)]
struct EncodeTuningArgs {
    /// Matrix side in modules (default: smallest that fits).
    #[arg(long, value_parser = clap::value_parser!(u32).range(MIN_SIDE as i64..=MAX_SIDE as i64))]
    side: Option<u32>,

    /// Module depth profile.
    #[arg(long, value_enum, default_value_t = DepthArg::Color32)]
    depth: DepthArg,

    /// Pixels per module edge recorded in the container.
    #[arg(long = "module-px", value_parser = clap::value_parser!(u16).range(1..), default_value_t = 4)]
    module_px: u16,

    /// Minimum pattern support is this value plus one.
    #[arg(long = "support-threshold", default_value_t = 3)]
    support_threshold: usize,

    /// Maximum dictionary entries for pattern substitution.
    #[arg(long = "max-patterns", value_parser = clap::value_parser!(u16).range(0..=255), default_value_t = 64)]
    max_patterns: u16,

    /// Header timestamp (Unix seconds) instead of the current time.
    #[arg(long)]
    timestamp: Option<u32>,

    /// Header id instead of a random one.
    #[arg(long)]
    id: Option<u32>,

    /// Omit the container's Adler-32 trailer.
    #[arg(long = "no-checksum")]
    no_checksum: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Payload content type; selects the compression mode.
    #[arg(long = "type", short = 't', value_enum, default_value_t = TypeArg::Binary)]
    content_type: TypeArg,

    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    #[command(flatten)]
    tuning: EncodeTuningArgs,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Input container (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Decode an unknown content type as binary instead of failing.
    #[arg(long)]
    lenient: bool,

    /// Check only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Input container (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Input container (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Accept an unknown content type code.
    #[arg(long)]
    lenient: bool,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Encode,
    Decode,
    Inspect,
    Config,
}

struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    no_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    content_type: ContentType,
    encode: EncodeOptions,
    container: ContainerOptions,
    decode: DecodeOptions,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        use_stdout: false,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        no_output: false,
        input_file: None,
        output_file: None,
        content_type: ContentType::Binary,
        encode: EncodeOptions::default(),
        container: ContainerOptions::default(),
        decode: DecodeOptions::default(),
    };

    match cli.command {
        Cmd::Encode(args) => {
            let t = args.tuning;
            opts.command = Command::Encode;
            opts.use_stdout = args.stdout;
            opts.input_file = args.input.or(args.input_pos);
            opts.output_file = args.output.or(args.output_pos);
            opts.content_type = args.content_type.into();
            opts.encode = EncodeOptions {
                side: t.side.map(|s| s as usize),
                depth: t.depth.into(),
                compress: CompressOptions {
                    support_threshold: t.support_threshold,
                    max_patterns: t.max_patterns as usize,
                },
                timestamp: t.timestamp,
                id: t.id,
            };
            opts.container = ContainerOptions {
                module_px: t.module_px,
                checksum: !t.no_checksum,
            };
        }
        Cmd::Decode(args) => {
            opts.command = Command::Decode;
            opts.use_stdout = args.stdout;
            opts.no_output = args.no_output;
            opts.input_file = args.input.or(args.input_pos);
            opts.output_file = args.output.or(args.output_pos);
            opts.decode.unknown_type_as_binary = args.lenient;
        }
        Cmd::Inspect(args) => {
            opts.command = Command::Inspect;
            opts.input_file = args.input;
            opts.decode.unknown_type_as_binary = args.lenient;
        }
        Cmd::Config => {}
    }
    opts
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("hmqc".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared I/O helpers
// ---------------------------------------------------------------------------

fn read_input(path: Option<&Path>) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    match path {
        Some(path) => {
            BufReader::with_capacity(BUF_SIZE, File::open(path)?).read_to_end(&mut data)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut data)?;
        }
    }
    Ok(data)
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            File::create(path)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", path.display()))
        }
    }
}

fn load_container(opts: &Options) -> Result<StoredMatrix, String> {
    let bytes = read_input(opts.input_file.as_deref()).map_err(|e| format!("input: {e}"))?;
    read_matrix(&mut bytes.as_slice()).map_err(|e| format!("container: {e}"))
}

fn print_json(json: &serde_json::Value) {
    eprintln!("{}", serde_json::to_string_pretty(json).unwrap_or_default());
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("hmqc version {version} (format {CURRENT_VERSION})");

    let adler32 = cfg!(feature = "adler32") as u8;
    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;

    eprintln!("ADLER32={adler32}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("RS_CODEWORD={CODEWORD_LEN}");
    eprintln!("RS_MESSAGE={MESSAGE_LEN}");
    eprintln!("RS_CORRECTABLE={MAX_CORRECTABLE}");
    eprintln!("MATRIX_SIDE={MIN_SIDE}..={MAX_SIDE}");

    0
}

// ---------------------------------------------------------------------------
// Encode command
// ---------------------------------------------------------------------------

fn cmd_encode(opts: &Options) -> i32 {
    let payload = match read_input(opts.input_file.as_deref()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("hmqc: input: {e}");
            return 1;
        }
    };

    let encoded =
        match pipeline::encode_with(&payload, opts.content_type, &opts.encode, &mut NoProgress) {
            Ok(encoded) => encoded,
            Err(e) => {
                eprintln!("hmqc: encode error: {e}");
                return 1;
            }
        };

    let mut writer = match open_output(opts) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("hmqc: {e}");
            return 1;
        }
    };
    let written = match write_matrix(&mut writer, &encoded.matrix, &opts.container) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("hmqc: write error: {e}");
            return 1;
        }
    };
    if let Err(e) = writer.flush() {
        eprintln!("hmqc: write flush error: {e}");
        return 1;
    }

    let stats = &encoded.stats;
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "hmqc: encoder: {} bytes -> {} compressed, {} codewords, {side}x{side} {} matrix",
            stats.original_size,
            stats.compressed_size,
            stats.codewords,
            encoded.matrix.depth(),
            side = stats.side,
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "encode",
            "content_type": opts.content_type.name(),
            "input_size": stats.original_size,
            "compressed_size": stats.compressed_size,
            "codewords": stats.codewords,
            "side": stats.side,
            "depth": encoded.matrix.depth().to_string(),
            "capacity": stats.capacity,
            "container_size": written,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options) -> i32 {
    let stored = match load_container(opts) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("hmqc: {e}");
            return 1;
        }
    };

    let corners = pipeline::module_corners(&stored.matrix);
    let decoded =
        match pipeline::decode_with(&stored.matrix, &corners, &opts.decode, &mut NoProgress) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("hmqc: decode error: {e}");
                return 1;
            }
        };

    if !opts.no_output {
        let mut writer = match open_output(opts) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("hmqc: {e}");
                return 1;
            }
        };
        if let Err(e) = writer.write_all(&decoded.payload).and_then(|_| writer.flush()) {
            eprintln!("hmqc: write error: {e}");
            return 1;
        }
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "hmqc: decoder: {} {} bytes, {} symbol errors corrected",
            decoded.content_type,
            decoded.payload.len(),
            decoded.corrected_errors
        );
    }

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "decode",
            "content_type": decoded.content_type.name(),
            "output_size": decoded.payload.len(),
            "corrected_errors": decoded.corrected_errors,
            "side": stored.matrix.side(),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(opts: &Options) -> i32 {
    let stored = match load_container(opts) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("hmqc: {e}");
            return 1;
        }
    };
    let m = &stored.matrix;
    let corners = pipeline::module_corners(m);
    let (header, corrected) = match pipeline::read_header(m, &corners, &opts.decode) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("hmqc: header: {e}");
            return 1;
        }
    };
    let marker_damage = matrix::marker::damaged_cells(m);

    if opts.json_output {
        print_json(&serde_json::json!({
            "command": "inspect",
            "side": m.side(),
            "depth": m.depth().to_string(),
            "module_px": stored.module_px,
            "checksum": stored.flags.contains(crate::io::ContainerFlags::CHECKSUM),
            "marker_damage": marker_damage,
            "version": header.version.to_string(),
            "content_type": header.content_type.name(),
            "original_size": header.original_size,
            "compressed_size": header.compressed_size,
            "timestamp": header.timestamp,
            "id": header.id,
            "header_corrections": corrected,
        }));
        return 0;
    }

    if !opts.quiet {
        println!("Matrix:            {side}x{side} {}", m.depth(), side = m.side());
        println!("Module size:       {} px", stored.module_px);
        println!("Capacity:          {} bytes", matrix::capacity(m.side(), m.depth()));
        println!("Marker damage:     {marker_damage} cells");
        println!("Format version:    {}", header.version);
        println!("Content type:      {}", header.content_type);
        println!("Original size:     {}", header.original_size);
        println!("Compressed size:   {}", header.compressed_size);
        println!("Timestamp:         {}", header.timestamp);
        println!("Id:                {}", hex(&header.id.to_be_bytes()));
        println!("Header corrected:  {corrected} symbols");
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && !opts.quiet
        && let Some(path) = &opts.output_file
    {
        eprintln!(
            "hmqc: warning: -c option overrides output filename: {}",
            path.display()
        );
    }
    if opts.use_stdout {
        opts.output_file = None;
    }

    let exit_code = match opts.command {
        Command::Encode => cmd_encode(&opts),
        Command::Decode => cmd_decode(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
