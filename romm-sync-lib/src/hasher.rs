//! Streaming file digests.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha1::Digest;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

fn for_each_chunk(reader: &mut dyn Read, mut f: impl FnMut(&[u8])) -> io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        f(&buf[..n]);
        total += n as u64;
    }
    Ok(total)
}

/// Lowercase hex SHA-1 of everything `reader` yields.
pub fn sha1_reader(reader: &mut dyn Read) -> io::Result<String> {
    let mut sha = sha1::Sha1::new();
    for_each_chunk(reader, |chunk| sha.update(chunk))?;
    Ok(format!("{:x}", sha.finalize()))
}

/// Lowercase hex MD5 of everything `reader` yields.
pub fn md5_reader(reader: &mut dyn Read) -> io::Result<String> {
    let mut ctx = md5::Context::new();
    for_each_chunk(reader, |chunk| ctx.consume(chunk))?;
    Ok(format!("{:x}", ctx.compute()))
}

pub fn sha1_file(path: &Path) -> io::Result<String> {
    sha1_reader(&mut File::open(path)?)
}

pub fn md5_file(path: &Path) -> io::Result<String> {
    md5_reader(&mut File::open(path)?)
}

pub fn md5_bytes(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
#[path = "tests/hasher_tests.rs"]
mod tests;
