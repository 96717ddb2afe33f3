use clap::builder::RangedU64ValueParser;
use clap::*;
use gcmap::libs::contact::{ChunkReport, ContactOpts, SinkOpts, SinkStrategy};
use std::time::{Duration, Instant};

// Create clap command arguments
pub fn make_command() -> Command {
    Command::new("gcmap")
        .about("`gcmap` - Genome Contact MAP by windowed edit distances")
        .after_help(
            r###"
This command compares every pair of positions (i, j), i <= j, of one sequence
by the edit distance of the windows starting at i and j.

Window length by distance:
    j - i <= 100,000      10 bp
    j - i <= 1,000,000    100 bp
    otherwise             1,000 bp

Output format:
    i,j,distance

Notes:
* Positions are 0-based.
* Pairs whose windows run past the end of the sequence are skipped.
* The first FASTA record is used unless --name is given.
* The outfile is truncated at the start of each run; --append keeps old rows.
* --sink stream writes rows as they are computed, in no particular order.
* --sink batch holds all rows in memory and writes them sorted at the end.
* --step N keeps only positions that are multiples of N. The number of pairs
  grows with the square of the sequence length, so use it for real genomes.

Examples:
1. Contact map of a short sequence:
   gcmap input.fa output.csv

2. Sample positions on a 1 kb grid with 8 threads:
   gcmap genome.fa.gz output.csv --step 1000 --parallel 8

3. Full symmetric matrix, sorted, with a one hour limit:
   gcmap input.fa output.csv --sink batch --mirror --timeout 3600

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input FASTA file to process. [stdin] for standard input"),
        )
        .arg(
            Arg::new("outfile")
                .required(true)
                .index(2)
                .help("Output filename. [stdout] for screen"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .num_args(1)
                .help("Name of the FASTA record to use"),
        )
        .arg(
            Arg::new("upper")
                .long("upper")
                .action(ArgAction::SetTrue)
                .help("Convert soft-masked bases to upper case"),
        )
        .arg(
            Arg::new("chunk")
                .long("chunk")
                .short('c')
                .num_args(1)
                .default_value("10000")
                .value_parser(RangedU64ValueParser::<usize>::new().range(1..))
                .help("Positions per synchronized chunk"),
        )
        .arg(
            Arg::new("step")
                .long("step")
                .short('s')
                .num_args(1)
                .default_value("1")
                .value_parser(RangedU64ValueParser::<usize>::new().range(1..))
                .help("Only use positions that are multiples of N"),
        )
        .arg(
            Arg::new("sink")
                .long("sink")
                .num_args(1)
                .default_value("stream")
                .value_parser(["stream", "batch"])
                .help("How results reach the outfile"),
        )
        .arg(
            Arg::new("mirror")
                .long("mirror")
                .action(ArgAction::SetTrue)
                .help("Also write j,i,distance for every i != j"),
        )
        .arg(
            Arg::new("append")
                .long("append")
                .action(ArgAction::SetTrue)
                .help("Append to the outfile instead of truncating it"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .help("Abort the run after this many seconds"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(usize))
                .help("Number of threads. [0] for all logical cores"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Print progress to stderr"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();
    let name = args.get_one::<String>("name").map(|s| s.as_str());
    let is_upper = args.get_flag("upper");
    let is_verbose = args.get_flag("verbose");

    let opts = ContactOpts {
        chunk_size: *args.get_one::<usize>("chunk").unwrap(),
        step: *args.get_one::<usize>("step").unwrap(),
        parallel: *args.get_one::<usize>("parallel").unwrap(),
        timeout: args.get_one::<u64>("timeout").map(|s| Duration::from_secs(*s)),
        ..Default::default()
    };
    let sink_opts = SinkOpts {
        strategy: args.get_one::<String>("sink").unwrap().parse::<SinkStrategy>()?,
        mirror: args.get_flag("mirror"),
        append: args.get_flag("append"),
        threads: opts.parallel,
    };

    if is_verbose {
        eprintln!("==> Inputs");
        eprintln!("    infile  = {}", display_path(infile)?);
        eprintln!("    outfile = {}", display_path(outfile)?);
    }

    //----------------------------
    // Load
    //----------------------------
    let seq = gcmap::libs::seq::load_sequence(infile, name, is_upper)?;
    if is_verbose {
        eprintln!("==> Sequence");
        eprintln!("    length = {}", seq.len());
    }

    //----------------------------
    // Compute
    //----------------------------
    // Truncates the outfile before any pair is computed
    let sink = gcmap::libs::contact::open_sink(outfile, &sink_opts)?;

    if is_verbose {
        eprintln!("==> Options");
        eprintln!("    chunk    = {}", opts.chunk_size);
        eprintln!("    step     = {}", opts.step);
        eprintln!("    parallel = {}", opts.parallel);
        eprintln!("    sink     = {:?}", sink_opts.strategy);
    }

    let start = Instant::now();
    let summary = gcmap::libs::contact::compute(&seq, &opts, sink, |report: &ChunkReport| {
        if is_verbose {
            eprintln!(
                "==> Chunk {}/{} [{}, {}): {} pairs, {:.1?}",
                report.index + 1,
                report.total,
                report.range.0,
                report.range.1,
                report.pairs,
                start.elapsed()
            );
        }
    })?;

    if is_verbose {
        eprintln!("==> Done");
        eprintln!("    chunks = {}", summary.chunks);
        eprintln!("    pairs  = {}", summary.pairs);
        eprintln!("    rows   = {}", summary.rows);
    }

    Ok(())
}

fn display_path(path: &str) -> anyhow::Result<String> {
    if path == "stdin" || path == "stdout" {
        Ok(path.to_string())
    } else {
        Ok(intspan::absolute_path(path)?.display().to_string())
    }
}
