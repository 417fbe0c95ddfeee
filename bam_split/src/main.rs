use anyhow::{Context, Result};
use bam_tools::{get_bam_offsets, get_zmw_bgzf_borders, split_bam, SplitOptions};
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
    name = "bam_split",
    about = "Split an indexed PacBio BAM file into record-aligned chunks"
)]
struct Cli {
    /// The path to the BAM file to split. `<in_path>.pbi` must exist.
    #[structopt(parse(from_os_str))]
    in_path: PathBuf,
    /// Number of chunks requested. Fewer are written if the file has fewer
    /// legal split points.
    #[structopt(short = "n", long, default_value = "1")]
    chunks: usize,
    /// Directory to write chunks to.
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    out_dir: PathBuf,
    /// Chunk file name prefix. Defaults to the input file name without extension.
    #[structopt(long)]
    prefix: Option<String>,
    /// Number of chunks written concurrently.
    #[structopt(long, default_value = "1")]
    threads: usize,
    /// Write a .pbi next to every chunk.
    #[structopt(short, long)]
    index: bool,
    /// Write a JSON summary of the chunks to this path.
    #[structopt(long, parse(from_os_str))]
    manifest: Option<PathBuf>,
    /// Print the chunk start offsets and exit.
    #[structopt(long)]
    offsets: bool,
    /// Print the legal split points and exit.
    #[structopt(long)]
    borders: bool,
    /// Verbose logging. Repeat for more.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn init_log(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let args = Cli::from_args();
    init_log(args.verbose);

    if args.borders {
        print_borders(&args)
    } else if args.offsets {
        print_offsets(&args)
    } else {
        split(args)
    }
}

fn print_borders(args: &Cli) -> Result<()> {
    let borders = get_zmw_bgzf_borders(&args.in_path)
        .with_context(|| format!("Failed to read borders of {}", args.in_path.display()))?;
    for border in borders {
        println!("{}\t{}\t{}", border.record_index, border.group_id, border.offset);
    }
    Ok(())
}

fn print_offsets(args: &Cli) -> Result<()> {
    let offsets = get_bam_offsets(&args.in_path, args.chunks)
        .with_context(|| format!("Failed to compute offsets of {}", args.in_path.display()))?;
    for offset in offsets {
        println!("{}", offset);
    }
    Ok(())
}

fn split(args: Cli) -> Result<()> {
    let Cli {
        in_path,
        chunks,
        out_dir,
        prefix,
        threads,
        index,
        manifest,
        ..
    } = args;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let opts = SplitOptions {
        out_dir,
        prefix,
        threads,
        write_index: index,
    };
    let summary = split_bam(&in_path, chunks, &opts)
        .with_context(|| format!("Failed to split {}", in_path.display()))?;

    if let Some(manifest) = manifest {
        summary
            .to_path(&manifest)
            .with_context(|| format!("Failed to write {}", manifest.display()))?;
    }
    info!(
        "Wrote {} of {} requested chunks",
        summary.n_chunks(),
        chunks
    );
    println!("{}", summary.n_chunks());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_split_flags() {
        let args = Cli::from_iter(&[
            "bam_split",
            "movie.subreads.bam",
            "-n",
            "4",
            "-o",
            "chunks",
            "--threads",
            "3",
            "--index",
            "--manifest",
            "chunks.json",
        ]);
        assert_eq!(args.in_path, PathBuf::from("movie.subreads.bam"));
        assert_eq!(args.chunks, 4);
        assert_eq!(args.out_dir, PathBuf::from("chunks"));
        assert_eq!(args.threads, 3);
        assert!(args.index);
        assert_eq!(args.manifest, Some(PathBuf::from("chunks.json")));
        assert!(!args.offsets && !args.borders);
    }

    #[test]
    fn test_split_missing_index() {
        let args = Cli::from_iter(&["bam_split", "does/not/exist.bam", "-o", "."]);
        let err = split(args).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.bam"));
    }
}
