use anyhow::{Context, Result};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use seqscout::{
    about,
    composition::CompositionStats,
    dna_generator::{embed_token, generate_dna},
    entrez::EntrezClient,
    fasta::{DEFAULT_LINE_WIDTH, FastaRecord, is_valid_sequence_id},
    logging,
    prompt::{self, Prompter},
    reference::{compare_with_reference, fetch_reference},
    settings::EntrezSettings,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Random DNA sequence generator with FASTA output and optional NCBI comparison.
#[derive(Parser, Debug)]
#[command(name = "fasta_generator", disable_version_flag = true)]
struct Args {
    /// Number of bases to generate.
    #[arg(short, long)]
    length: Option<usize>,

    /// Sequence ID; also the output file name (letters, digits, '_' or '-').
    #[arg(long)]
    id: Option<String>,

    /// Free-text description for the FASTA header.
    #[arg(long)]
    description: Option<String>,

    /// Text to splice into the sequence at a random position.
    #[arg(long)]
    token: Option<String>,

    /// NCBI accession to compare against; skips the comparison question.
    #[arg(long, value_name = "ACCESSION")]
    reference: Option<String>,

    /// Do not offer a comparison with an NCBI sequence.
    #[arg(long = "no-compare", conflicts_with = "reference")]
    no_compare: bool,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// FASTA line width.
    #[arg(long, default_value_t = DEFAULT_LINE_WIDTH)]
    width: usize,

    /// Directory for the FASTA file.
    #[arg(long = "out-dir", value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// JSON file with E-utilities settings.
    #[arg(long, value_name = "JSON")]
    settings: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print version information.
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn parse_sequence_id(raw: &str) -> std::result::Result<String, String> {
    let id = raw.trim();
    if is_valid_sequence_id(id) {
        Ok(id.to_string())
    } else {
        Err("Invalid ID. Use only letters, digits, underscore (_) or hyphen (-).".to_string())
    }
}

fn resolve<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    given: &Option<String>,
    question: &str,
) -> Result<String> {
    match given {
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(prompter.ask(question)?),
    }
}

fn compare_with_ncbi<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    args: &Args,
    generated: &str,
) -> Result<()> {
    let accession = match &args.reference {
        Some(acc) => acc.trim().to_string(),
        None => {
            if args.no_compare
                || !prompter.ask_yes_no(
                    "\nCompare the generated sequence with an NCBI reference sequence? (yes/no): ",
                )?
            {
                return Ok(());
            }
            prompter.ask("NCBI accession of the reference (e.g. NC_000024.10): ")?
        }
    };
    if accession.is_empty() {
        println!("No NCBI accession given.");
        return Ok(());
    }

    let settings = match &args.settings {
        Some(path) => EntrezSettings::from_json_file(&path.to_string_lossy())?,
        None => EntrezSettings::default(),
    }
    .with_env_overrides()
    .validated()?;
    let client = EntrezClient::new(settings).context("could not set up the NCBI client")?;

    println!("\nFetching {accession} from NCBI...");
    let reference = match fetch_reference(&client, &accession) {
        Ok(seq) => {
            println!("Fetched {} nucleotides.", seq.len());
            seq
        }
        Err(e) => {
            eprintln!("Could not fetch the reference sequence: {e}");
            return Ok(());
        }
    };

    match compare_with_reference(generated, &reference) {
        Ok(identity) => {
            println!(
                "\nGenerated sequence ({} bp) vs. leading window of {accession}:",
                generated.len()
            );
            println!("Nucleotide identity: {identity:.2}%");
        }
        Err(e) => println!("{e}; comparison is not possible."),
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();
    if args.version {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    logging::init(args.verbose);

    let mut prompter = prompt::stdio();
    let length = match args.length {
        Some(0) => anyhow::bail!("Sequence length must be a positive number"),
        Some(n) => n,
        None => prompter.ask_until("Sequence length (e.g. 20-1000): ", prompt::parse_positive_length)?,
    };
    let id = match args.id.as_deref().map(parse_sequence_id) {
        Some(parsed) => parsed.map_err(anyhow::Error::msg)?,
        None => prompter.ask_until(
            "Sequence ID (letters, digits, '_' or '-'): ",
            parse_sequence_id,
        )?,
    };
    let description = resolve(&mut prompter, &args.description, "Sequence description: ")?;
    let token = resolve(
        &mut prompter,
        &args.token,
        "Text to embed (leave empty to skip): ",
    )?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let original = generate_dna(length, &mut rng);
    let annotated = embed_token(&original, &token, &mut rng);

    let record = FastaRecord::new(&id, &description, &annotated.text)?;
    let path = record.default_path(&args.out_dir);
    if let Err(e) = record.write_to(&path, args.width) {
        eprintln!("{e}");
        return Ok(());
    }
    println!("\nSequence saved to {}", path.display());

    println!("\nStatistics of the generated sequence (without embedded text):");
    println!("{}", CompositionStats::from_sequence(&original));

    println!("\nContents of {}:", path.display());
    print!("{}", record.to_fasta_string(args.width));

    compare_with_ncbi(&mut prompter, &args, &original)
}
