#![doc = include_str!("../README.md")]

mod inout;
use inout::{gen_foreign, gen_keys, read_keys, show_keys};

mod verify;
use verify::verify;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dyn_size_of::GetSize;
use fks::stats::BuildStats;
use fks::{BuildConf, DuplicatePolicy, PerfectHashTable, Polynomial, Vector};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use tracing_subscriber::EnvFilter;

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum KeySource {
    /// Random vectors with integral components
    rand,
    /// Vectors read from the file given by --file, one per line
    file
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Builds a two-level perfect hash table for vectors of complex numbers and prints its content and statistics.
pub struct Conf {
    #[arg(short='s', long, value_enum, default_value_t = KeySource::rand)]
    pub source: KeySource,

    /// The number of random keys
    #[arg(short='n', long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub keys_num: u64,

    /// The number of components of each random key
    #[arg(short='d', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub dimension: u64,

    /// The maximum magnitude of the real and imaginary parts of the components of random keys
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(i32).range(0..))]
    pub bound: i32,

    /// The file to read keys from (with --source file)
    #[arg(short='f', long)]
    pub file: Option<PathBuf>,

    /// Seed for generating keys and drawing hash functions (random by default)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Whether to fail instead of packing buckets that contain duplicate keys
    #[arg(long, default_value_t = false)]
    pub reject_duplicates: bool,

    /// Number of random keys outside the collection used to test negative lookups
    #[arg(long, default_value_t = 0)]
    pub foreign_keys_num: usize,

    /// Whether to print the keys
    #[arg(long, default_value_t = false)]
    pub show_keys: bool,

    /// Whether to print the content of the table
    #[arg(long, default_value_t = false)]
    pub show_table: bool,

    /// Whether to check the validity of the built table
    #[arg(short='v', long, default_value_t = false)]
    pub verify: bool,
}

impl Conf {
    fn rng(&self) -> Pcg64Mcg {
        match self.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::from_entropy()
        }
    }

    fn build_conf(&self) -> BuildConf<Polynomial> {
        BuildConf {
            seed: self.seed,
            duplicates: if self.reject_duplicates { DuplicatePolicy::Reject } else { DuplicatePolicy::Pack },
            ..Default::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let conf = Conf::parse();
    let mut rng = conf.rng();
    let dimension = conf.dimension as usize;
    let keys: Vec<Vector> = match conf.source {
        KeySource::rand => gen_keys(&mut rng, conf.keys_num as usize, dimension, conf.bound),
        KeySource::file => {
            let path = conf.file.as_ref().ok_or("--source file requires --file")?;
            read_keys(path)?
        }
    };
    let foreign = gen_foreign(&mut rng, conf.foreign_keys_num, dimension, conf.bound, &keys);
    println!("{} keys, {} foreign keys", keys.len(), foreign.len());
    if conf.show_keys { show_keys(&keys); }

    let mut stats = BuildStats::default();
    let table = PerfectHashTable::with_conf_stats(keys.clone(), conf.build_conf(), &mut stats)?;
    if conf.show_table { print!("{}", table); }
    println!("{}", stats);
    let bytes = table.size_bytes();
    println!("size: {} bytes, {:.2} bytes/key, {:.2} slots/key",
        bytes, bytes as f64 / keys.len() as f64, table.slots_len() as f64 / keys.len() as f64);

    if conf.verify {
        let result = verify(&table, &keys, &foreign)?;
        println!("verified: {} distinct keys found at distinct addresses ({:.2} comparisons/lookup), {} foreign keys not found",
            result.distinct, result.avg_probes, result.foreign);
    }
    Ok(())
}
