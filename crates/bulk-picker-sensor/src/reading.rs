//! Parsing and reduction of distance readings.

use crate::SensorError;
use std::io::{BufRead, ErrorKind};

/// First run of ASCII digits in `line`, as millimetres.
///
/// Lines without digits, or whose first run overflows `u32`, yield `None`.
pub fn parse_distance_line(line: &str) -> Option<u32> {
    let start = line.find(|c: char| c.is_ascii_digit())?;
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Read lines until `times` of them parse as distances.
///
/// Malformed lines are skipped and not counted. Read timeouts are retried
/// without losing a partially received line. End of stream before enough
/// readings is [`SensorError::StreamClosed`].
pub fn read_distances<R: BufRead>(reader: &mut R, times: usize) -> Result<Vec<u32>, SensorError> {
    let mut out = Vec::with_capacity(times);
    let mut buf = Vec::new();
    while out.len() < times {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) if buf.is_empty() => {
                return Err(SensorError::StreamClosed {
                    got: out.len(),
                    wanted: times,
                })
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                match parse_distance_line(&line) {
                    Some(d) => out.push(d),
                    None => log::trace!("skipping sensor line {:?}", line.trim_end()),
                }
                buf.clear();
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(out)
}

/// Median of the readings strictly below `max_valid`.
///
/// An even count averages the two middle values.
pub fn reduce_distance(samples: &[u32], max_valid: u32) -> Result<f64, SensorError> {
    let mut valid: Vec<u32> = samples.iter().copied().filter(|&d| d < max_valid).collect();
    if valid.is_empty() {
        return Err(SensorError::NoValidReadings {
            total: samples.len(),
            max_valid,
        });
    }
    valid.sort_unstable();
    let mid = valid.len() / 2;
    Ok(if valid.len() % 2 == 1 {
        valid[mid] as f64
    } else {
        (valid[mid - 1] as f64 + valid[mid] as f64) / 2.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Cursor, Read};

    #[test]
    fn first_digit_run_is_taken() {
        assert_eq!(parse_distance_line("87\r\n"), Some(87));
        assert_eq!(parse_distance_line("Range: 42 mm (status 0)"), Some(42));
        assert_eq!(parse_distance_line("b'105\\r\\n'"), Some(105));
        assert_eq!(parse_distance_line("sensor ready"), None);
        assert_eq!(parse_distance_line(""), None);
        assert_eq!(parse_distance_line("99999999999"), None);
    }

    #[test]
    fn malformed_lines_do_not_count() {
        let mut input = Cursor::new("boot\n12\n\nerr\n13\n14\n15\n");
        assert_eq!(read_distances(&mut input, 3).expect("read"), vec![12, 13, 14]);
    }

    #[test]
    fn last_line_without_newline_still_counts() {
        let mut input = Cursor::new("7\n8");
        assert_eq!(read_distances(&mut input, 2).expect("read"), vec![7, 8]);
    }

    #[test]
    fn short_stream_is_closed_error() {
        let mut input = Cursor::new("1\nx\n2\n");
        assert!(matches!(
            read_distances(&mut input, 3),
            Err(SensorError::StreamClosed { got: 2, wanted: 3 })
        ));
    }

    /// Emits its bytes in small chunks with a timeout after each one.
    struct Stuttering {
        data: Vec<u8>,
        pos: usize,
        timed_out: bool,
    }

    impl Read for Stuttering {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.timed_out {
                self.timed_out = false;
                let n = buf.len().min(2).min(self.data.len() - self.pos);
                buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            } else {
                self.timed_out = true;
                Err(io::Error::new(ErrorKind::TimedOut, "timeout"))
            }
        }
    }

    #[test]
    fn timeouts_keep_partial_lines() {
        let mut reader = BufReader::new(Stuttering {
            data: b"123\n45\n".to_vec(),
            pos: 0,
            timed_out: false,
        });
        assert_eq!(read_distances(&mut reader, 2).expect("read"), vec![123, 45]);
    }

    #[test]
    fn median_drops_far_readings() {
        let d = reduce_distance(&[100, 101, 99, 150, 102, 98], 130).expect("median");
        assert_eq!(d, 100.0);
    }

    #[test]
    fn even_count_averages_middle_pair() {
        assert_eq!(reduce_distance(&[10, 20, 30, 40], 130).expect("median"), 25.0);
        assert_eq!(reduce_distance(&[55], 130).expect("median"), 55.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(matches!(
            reduce_distance(&[130, 200, 255], 130),
            Err(SensorError::NoValidReadings { total: 3, .. })
        ));
        assert!(matches!(
            reduce_distance(&[], 130),
            Err(SensorError::NoValidReadings { total: 0, .. })
        ));
    }
}
