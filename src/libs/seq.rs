use crate::libs::error::ContactError;
use std::io::BufRead;

/// Loads the body of one FASTA record as a byte sequence.
///
/// The first record is used unless `name` selects another one. Line breaks are
/// removed, the header is discarded. With `upper`, soft-masked (lower case)
/// bases are folded to upper case.
///
/// Fails with `InputRead` when the file can't be opened, doesn't start with a
/// `>` header, or contains no record called `name`.
///
/// ```
/// let seq = gcmap::libs::seq::load_sequence("tests/contact/short.fa", None, false).unwrap();
/// assert_eq!(seq, b"ACGTACGTAC");
/// ```
pub fn load_sequence(
    infile: &str,
    name: Option<&str>,
    upper: bool,
) -> Result<Vec<u8>, ContactError> {
    let input_err = |msg: String| ContactError::InputRead(format!("{}: {}", infile, msg));

    let mut reader = crate::reader(infile).map_err(|e| input_err(e.to_string()))?;

    // The first byte must be the header marker
    let first = reader
        .fill_buf()
        .map_err(|e| input_err(e.to_string()))?
        .first()
        .copied();
    if first != Some(b'>') {
        return Err(input_err("missing FASTA header marker '>'".to_string()));
    }

    let mut fa_in = noodles_fasta::io::Reader::new(reader);
    for result in fa_in.records() {
        let record = result.map_err(|e| input_err(e.to_string()))?;
        let rec_name: &[u8] = record.name().as_ref();
        if name.map_or(true, |n| n.as_bytes() == rec_name) {
            let mut seq = record.sequence().as_ref().to_vec();
            if upper {
                seq.make_ascii_uppercase();
            }
            return Ok(seq);
        }
    }

    match name {
        Some(n) => Err(input_err(format!("no sequence named '{}'", n))),
        None => Err(input_err("no FASTA record".to_string())),
    }
}
