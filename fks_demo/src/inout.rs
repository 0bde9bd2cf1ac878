use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use fks::{Complex, Vector};
use rand::Rng;

/// Returns a random vector of `dimension` complex numbers with components in `[-bound, bound]`.
pub fn rand_vector<R: Rng>(rng: &mut R, dimension: usize, bound: i32) -> Vector {
    (0..dimension).map(|_| Complex::from_ints(rng.gen_range(-bound..=bound), rng.gen_range(-bound..=bound))).collect()
}

/// Returns `keys_num` random vectors (possibly with duplicates, like any random sample).
pub fn gen_keys<R: Rng>(rng: &mut R, keys_num: usize, dimension: usize, bound: i32) -> Vec<Vector> {
    (0..keys_num).map(|_| rand_vector(rng, dimension, bound)).collect()
}

/// Returns up to `foreign_keys_num` random vectors that are not included in `keys`.
///
/// Fewer vectors are returned if they are hard to find, i.e. `keys` cover most of the space.
pub fn gen_foreign<R: Rng>(rng: &mut R, foreign_keys_num: usize, dimension: usize, bound: i32, keys: &[Vector]) -> Vec<Vector> {
    let included: BTreeSet<&Vector> = keys.iter().collect();
    let mut result = Vec::with_capacity(foreign_keys_num);
    for _ in 0..foreign_keys_num.saturating_mul(100) {
        if result.len() == foreign_keys_num { break; }
        let v = rand_vector(rng, dimension, bound);
        if !included.contains(&v) { result.push(v); }
    }
    result
}

/// Reads keys from the file at `path`, one vector per line. Blank lines are skipped.
pub fn read_keys(path: &Path) -> io::Result<Vec<Vector>> {
    let mut keys = Vec::new();
    for (line_nr, line) in BufReader::new(File::open(path)?).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let key = line.parse::<Vector>().map_err(|e|
            io::Error::new(io::ErrorKind::InvalidData, format!("{}:{}: {}", path.display(), line_nr + 1, e))
        )?;
        keys.push(key);
    }
    Ok(keys)
}

/// Prints `keys`, five per line.
pub fn show_keys(keys: &[Vector]) {
    println!("[data] = {{");
    for chunk in keys.chunks(5) {
        let line: Vec<String> = chunk.iter().map(ToString::to_string).collect();
        println!("    {}", line.join("  "));
    }
    println!("}}");
}
