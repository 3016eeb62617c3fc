//! Single-pass line source over a bounded text input.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Read};
use std::path::Path;

#[cfg(feature = "gzip")]
use flate2::read::GzDecoder;

/// Lazy, non-restartable sequence of data lines.
///
/// The first line of the input is a header and is discarded before any line is
/// yielded. Dropping the source releases the underlying handle, whether the
/// input was exhausted or not.
pub struct LineSource {
    lines: Lines<BufReader<Box<dyn Read>>>,
    header_skipped: bool,
}

impl LineSource {
    /// Open `path` for reading. Paths ending in `.gz` are decompressed on the fly
    /// when the `gzip` feature is enabled.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            io::Error::new(err.kind(), format!("open input {}: {err}", path.display()))
        })?;
        Ok(Self::from_reader(wrap_input(path, file)))
    }

    pub fn from_reader<R: Read + 'static>(reader: R) -> Self {
        let reader: Box<dyn Read> = Box::new(reader);
        Self {
            lines: BufReader::new(reader).lines(),
            header_skipped: false,
        }
    }
}

impl Iterator for LineSource {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header_skipped {
            self.header_skipped = true;
            match self.lines.next()? {
                Ok(header) => log::trace!("skipped header: {header}"),
                Err(err) => return Some(Err(err)),
            }
        }
        self.lines.next()
    }
}

#[cfg(feature = "gzip")]
fn wrap_input(path: &Path, file: File) -> Box<dyn Read> {
    if path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    }
}

#[cfg(not(feature = "gzip"))]
fn wrap_input(_path: &Path, file: File) -> Box<dyn Read> {
    Box::new(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &'static str) -> LineSource {
        LineSource::from_reader(text.as_bytes())
    }

    #[test]
    fn skips_exactly_one_header() {
        let lines: Vec<String> = source("seq_num,time\n1,a\n2,b\n")
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["1,a".to_string(), "2,b".to_string()]);
    }

    #[test]
    fn header_only_and_empty_inputs_yield_nothing() {
        assert_eq!(source("seq_num,time\n").count(), 0);
        assert_eq!(source("").count(), 0);
    }

    #[test]
    fn strips_crlf_line_endings() {
        let lines: Vec<String> = source("h\r\n1,a\r\n")
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["1,a".to_string()]);
    }

    #[test]
    fn invalid_utf8_is_an_io_error() {
        let bytes: &'static [u8] = b"h\n\xff\xfe\n";
        let mut source = LineSource::from_reader(bytes);
        let err = source.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = match LineSource::open("/nonexistent/l3/feed.csv") {
            Ok(_) => panic!("expected open failure"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("feed.csv"));
    }
}
