use std::io::{BufRead, BufReader, BufWriter, Write};

/// ```
/// use std::io::BufRead;
/// let reader = gcmap::reader("tests/contact/short.fa").unwrap();
/// let lines = reader.lines().collect::<Vec<_>>();
/// assert_eq!(lines.len(), 2);
///
/// assert!(gcmap::reader("tests/contact/not-there.fa").is_err());
/// ```
pub fn reader(input: &str) -> std::io::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Opens `stdout` or a file. Files are truncated unless `append` is set.
pub fn writer(output: &str, append: bool) -> std::io::Result<Box<dyn Write + Send>> {
    let writer: Box<dyn Write + Send> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(output)?;
        Box::new(BufWriter::with_capacity(128 * 1024, file))
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_reader_gz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seq.fa.gz");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder =
                flate2::write::GzEncoder::new(file, flate2::Compression::default());
            write!(encoder, ">seq\nACGT\n").unwrap();
            encoder.finish().unwrap();
        }

        let mut content = String::new();
        reader(path.to_str().unwrap())
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, ">seq\nACGT\n");
    }

    #[test]
    fn test_writer_truncate_and_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let path = path.to_str().unwrap();

        for _ in 0..2 {
            let mut w = writer(path, false).unwrap();
            writeln!(w, "0,0,0").unwrap();
        }
        assert_eq!(std::fs::read_to_string(path).unwrap(), "0,0,0\n");

        {
            let mut w = writer(path, true).unwrap();
            writeln!(w, "0,1,2").unwrap();
        }
        assert_eq!(std::fs::read_to_string(path).unwrap(), "0,0,0\n0,1,2\n");
    }
}
