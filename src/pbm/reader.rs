//! Streaming reader for netpbm bitmaps.
//!
//! Only the header is parsed up front; raster rows are decoded on demand so a
//! caller never holds more than one row of the image.

use crate::pbm::RowSource;
use crate::util::{PbmGrepError, PbmGrepResult};
use std::io::{self, BufRead};

/// Raster encoding of a PBM stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PbmFormat {
    /// `P1`: ASCII digits, whitespace optional between pixels.
    Plain,
    /// `P4`: rows packed eight pixels per byte, MSB first, byte-aligned.
    Raw,
}

/// Row-at-a-time PBM decoder.
///
/// Construction reads only the header and allocates nothing proportional to
/// the declared width; the row buffer for `P4` data is created on the first
/// `read_row`.
pub struct PbmReader<R> {
    reader: R,
    format: PbmFormat,
    width: usize,
    height: usize,
    next_row: usize,
    raw: Vec<u8>,
}

impl<R: BufRead> PbmReader<R> {
    /// Parses the header and positions the reader at the first raster row.
    pub fn new(mut reader: R) -> PbmGrepResult<Self> {
        let mut magic = [0u8; 2];
        reader
            .read_exact(&mut magic)
            .map_err(|err| header_error(format!("missing magic number: {err}")))?;
        let format = match &magic {
            b"P1" => PbmFormat::Plain,
            b"P4" => PbmFormat::Raw,
            _ => return Err(header_error("not a PBM bitmap (expected P1 or P4)")),
        };

        let width = read_header_uint(&mut reader, "width")?;
        let height = read_header_uint(&mut reader, "height")?;
        if width == 0 {
            return Err(PbmGrepError::InvalidDimensions { width, height });
        }

        if format == PbmFormat::Raw {
            // Exactly one whitespace byte separates the header from raw data.
            match next_byte(&mut reader).map_err(|err| header_error(err.to_string()))? {
                Some(b) if b.is_ascii_whitespace() => {}
                _ => return Err(header_error("missing separator before raster")),
            }
        }

        Ok(Self {
            reader,
            format,
            width,
            height,
            next_row: 0,
            raw: Vec::new(),
        })
    }

    /// Returns the raster encoding declared by the header.
    pub fn format(&self) -> PbmFormat {
        self.format
    }

    /// Returns the number of rows already decoded.
    pub fn rows_read(&self) -> usize {
        self.next_row
    }

    fn read_plain_row(&mut self, row: &mut [u8]) -> PbmGrepResult<()> {
        let y = self.next_row;
        for pixel in row.iter_mut() {
            skip_whitespace(&mut self.reader).map_err(|err| stream_error(y, err))?;
            *pixel = match next_byte(&mut self.reader).map_err(|err| stream_error(y, err))? {
                Some(b'0') => 0,
                Some(b'1') => 1,
                Some(other) => {
                    return Err(PbmGrepError::StreamRead {
                        row: y,
                        reason: format!("unexpected byte 0x{other:02x} in raster"),
                    })
                }
                None => {
                    return Err(PbmGrepError::StreamRead {
                        row: y,
                        reason: "unexpected end of stream".to_string(),
                    })
                }
            };
        }
        Ok(())
    }

    fn read_raw_row(&mut self, row: &mut [u8]) -> PbmGrepResult<()> {
        let y = self.next_row;
        // Sized on first use: the header width is untrusted until the caller
        // has checked it against its own limit.
        if self.raw.is_empty() {
            self.raw = vec![0u8; self.width.div_ceil(8)];
        }
        self.reader
            .read_exact(&mut self.raw)
            .map_err(|err| stream_error(y, err))?;
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = (self.raw[x / 8] >> (7 - x % 8)) & 1;
        }
        Ok(())
    }
}

impl<R: BufRead> RowSource for PbmReader<R> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn read_row(&mut self, row: &mut [u8]) -> PbmGrepResult<()> {
        if row.len() != self.width {
            return Err(PbmGrepError::RowLength {
                expected: self.width,
                got: row.len(),
            });
        }
        if self.next_row >= self.height {
            return Err(PbmGrepError::StreamRead {
                row: self.next_row,
                reason: "read past the last row".to_string(),
            });
        }
        match self.format {
            PbmFormat::Plain => self.read_plain_row(row)?,
            PbmFormat::Raw => self.read_raw_row(row)?,
        }
        self.next_row += 1;
        Ok(())
    }
}

fn header_error(reason: impl Into<String>) -> PbmGrepError {
    PbmGrepError::InvalidHeader {
        reason: reason.into(),
    }
}

fn stream_error(row: usize, err: io::Error) -> PbmGrepError {
    let reason = match err.kind() {
        io::ErrorKind::UnexpectedEof => "unexpected end of stream".to_string(),
        _ => err.to_string(),
    };
    PbmGrepError::StreamRead { row, reason }
}

fn peek_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    Ok(reader.fill_buf()?.first().copied())
}

fn next_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    let byte = peek_byte(reader)?;
    if byte.is_some() {
        reader.consume(1);
    }
    Ok(byte)
}

fn skip_whitespace<R: BufRead>(reader: &mut R) -> io::Result<()> {
    while let Some(b) = peek_byte(reader)? {
        if !b.is_ascii_whitespace() {
            break;
        }
        reader.consume(1);
    }
    Ok(())
}

/// Skips whitespace and `#` comments, which run to the end of the line.
fn skip_header_filler<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        skip_whitespace(reader)?;
        if peek_byte(reader)? != Some(b'#') {
            return Ok(());
        }
        while let Some(b) = next_byte(reader)? {
            if b == b'\n' || b == b'\r' {
                break;
            }
        }
    }
}

fn read_header_uint<R: BufRead>(reader: &mut R, field: &'static str) -> PbmGrepResult<usize> {
    skip_header_filler(reader).map_err(|err| header_error(err.to_string()))?;
    let mut value: Option<usize> = None;
    while let Some(b) = peek_byte(reader).map_err(|err| header_error(err.to_string()))? {
        if !b.is_ascii_digit() {
            break;
        }
        reader.consume(1);
        let digit = usize::from(b - b'0');
        value = Some(
            value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| header_error(format!("{field} is out of range")))?,
        );
    }
    value.ok_or_else(|| header_error(format!("missing {field}")))
}
