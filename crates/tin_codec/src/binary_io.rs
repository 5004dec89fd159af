//! Endian-explicit binary stream I/O with continuing error tracking.
//!
//! Every read and write records failures into a [`BinaryIoErrorTracker`]
//! instead of aborting; the tracker keeps the first and the last error so
//! a caller can tell the original failure from the cascade that follows
//! it, and partial streams stay diagnosable.

use std::fmt;
use std::io::{Read, Write};

/// Byte order of the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
  Little,
  Big,
}

impl Endianness {
  pub fn host() -> Self {
    if cfg!(target_endian = "big") {
      Endianness::Big
    } else {
      Endianness::Little
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IoDirection {
  #[default]
  None,
  Read,
  Write,
}

/// One recorded failure: what was being transferred, where, and how much
/// of it actually moved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinaryIoError {
  pub type_name: Option<&'static str>,
  pub position: u64,
  pub direction: IoDirection,
  pub expected_bytes: usize,
  pub actual_bytes: usize,
}

impl BinaryIoError {
  pub fn is_error(&self) -> bool {
    self.type_name.is_some()
  }
}

impl fmt::Display for BinaryIoError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.type_name {
      None => write!(f, "no error"),
      Some(name) => write!(
        f,
        "{} of {} at position {} short: {} of {} bytes",
        match self.direction {
          IoDirection::Read => "read",
          IoDirection::Write => "write",
          IoDirection::None => "transfer",
        },
        name,
        self.position,
        self.actual_bytes,
        self.expected_bytes
      ),
    }
  }
}

/// First and most recent failure of a stream session.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryIoErrorTracker {
  pub first_error: BinaryIoError,
  pub last_error: BinaryIoError,
}

impl BinaryIoErrorTracker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn has_error(&self) -> bool {
    self.first_error.is_error()
  }

  fn record(&mut self, error: BinaryIoError) {
    if !self.first_error.is_error() {
      self.first_error = error;
    }
    self.last_error = error;
  }
}

impl fmt::Display for BinaryIoErrorTracker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !self.has_error() {
      write!(f, "no error")
    } else if self.first_error == self.last_error {
      write!(f, "{}", self.first_error)
    } else {
      write!(f, "first: {}; last: {}", self.first_error, self.last_error)
    }
  }
}

/// Fixed-size scalar that can cross the wire in either byte order.
pub trait WireScalar: Copy + Default {
  const NAME: &'static str;
  const SIZE: usize;

  fn put(self, endianness: Endianness, buf: &mut [u8]);
  fn take(endianness: Endianness, buf: &[u8]) -> Self;
}

macro_rules! impl_wire_scalar {
  ($ty:ty, $name:literal) => {
    impl WireScalar for $ty {
      const NAME: &'static str = $name;
      const SIZE: usize = std::mem::size_of::<$ty>();

      fn put(self, endianness: Endianness, buf: &mut [u8]) {
        let bytes = match endianness {
          Endianness::Little => self.to_le_bytes(),
          Endianness::Big => self.to_be_bytes(),
        };
        buf[..Self::SIZE].copy_from_slice(&bytes);
      }

      fn take(endianness: Endianness, buf: &[u8]) -> Self {
        let mut bytes = [0u8; Self::SIZE];
        bytes.copy_from_slice(&buf[..Self::SIZE]);
        match endianness {
          Endianness::Little => <$ty>::from_le_bytes(bytes),
          Endianness::Big => <$ty>::from_be_bytes(bytes),
        }
      }
    }
  };
}

impl_wire_scalar!(u8, "u8");
impl_wire_scalar!(u16, "u16");
impl_wire_scalar!(i16, "i16");
impl_wire_scalar!(u32, "u32");
impl_wire_scalar!(i32, "i32");
impl_wire_scalar!(f32, "f32");
impl_wire_scalar!(f64, "f64");

/// Sequential binary stream with independent read and write cursors.
pub struct BinaryIo<S> {
  stream: S,
  target_endianness: Endianness,
  read_pos: u64,
  write_pos: u64,
}

impl<S> BinaryIo<S> {
  pub fn new(stream: S, target_endianness: Endianness) -> Self {
    BinaryIo {
      stream,
      target_endianness,
      read_pos: 0,
      write_pos: 0,
    }
  }

  pub fn read_pos(&self) -> u64 {
    self.read_pos
  }

  pub fn write_pos(&self) -> u64 {
    self.write_pos
  }

  pub fn into_inner(self) -> S {
    self.stream
  }
}

impl<S: Read> BinaryIo<S> {
  pub fn read_scalar<T: WireScalar>(&mut self, out: &mut T, e: &mut BinaryIoErrorTracker) {
    let mut buf = [0u8; 8];
    let buf = &mut buf[..T::SIZE];

    match read_fully(&mut self.stream, buf) {
      Ok(()) => {
        *out = T::take(self.target_endianness, buf);
        self.read_pos += T::SIZE as u64;
      }
      Err(actual) => {
        e.record(BinaryIoError {
          type_name: Some(T::NAME),
          position: self.read_pos,
          direction: IoDirection::Read,
          expected_bytes: T::SIZE,
          actual_bytes: actual,
        });
        self.read_pos += actual as u64;
        *out = T::default();
      }
    }
  }

  /// Read `count` scalars; on a short read the returned vector is
  /// truncated to the elements actually read.
  pub fn read_array<T: WireScalar>(
    &mut self,
    count: usize,
    e: &mut BinaryIoErrorTracker,
  ) -> Vec<T> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
      let before = e.has_error();
      let mut v = T::default();
      self.read_scalar(&mut v, e);
      if !before && e.has_error() {
        break;
      }
      out.push(v);
    }
    out
  }

  pub fn read_u8(&mut self, out: &mut u8, e: &mut BinaryIoErrorTracker) {
    self.read_scalar(out, e)
  }
  pub fn read_u16(&mut self, out: &mut u16, e: &mut BinaryIoErrorTracker) {
    self.read_scalar(out, e)
  }
  pub fn read_u32(&mut self, out: &mut u32, e: &mut BinaryIoErrorTracker) {
    self.read_scalar(out, e)
  }
  pub fn read_f32(&mut self, out: &mut f32, e: &mut BinaryIoErrorTracker) {
    self.read_scalar(out, e)
  }
  pub fn read_f64(&mut self, out: &mut f64, e: &mut BinaryIoErrorTracker) {
    self.read_scalar(out, e)
  }

  /// Discard `count` bytes.
  pub fn read_skip(&mut self, count: usize, e: &mut BinaryIoErrorTracker) {
    let mut remaining = count;
    let mut buf = [0u8; 64];
    while remaining > 0 {
      let chunk = remaining.min(buf.len());
      match read_fully(&mut self.stream, &mut buf[..chunk]) {
        Ok(()) => {
          self.read_pos += chunk as u64;
          remaining -= chunk;
        }
        Err(actual) => {
          e.record(BinaryIoError {
            type_name: Some("padding"),
            position: self.read_pos,
            direction: IoDirection::Read,
            expected_bytes: count,
            actual_bytes: count - remaining + actual,
          });
          self.read_pos += actual as u64;
          return;
        }
      }
    }
  }
}

impl<S: Write> BinaryIo<S> {
  pub fn write_scalar<T: WireScalar>(&mut self, v: T, e: &mut BinaryIoErrorTracker) {
    let mut buf = [0u8; 8];
    let buf = &mut buf[..T::SIZE];
    v.put(self.target_endianness, buf);

    match self.stream.write_all(buf) {
      Ok(()) => {
        self.write_pos += T::SIZE as u64;
      }
      Err(_) => {
        e.record(BinaryIoError {
          type_name: Some(T::NAME),
          position: self.write_pos,
          direction: IoDirection::Write,
          expected_bytes: T::SIZE,
          actual_bytes: 0,
        });
      }
    }
  }

  pub fn write_array<T: WireScalar>(&mut self, values: &[T], e: &mut BinaryIoErrorTracker) {
    for v in values {
      self.write_scalar(*v, e);
    }
  }

  pub fn write_u8(&mut self, v: u8, e: &mut BinaryIoErrorTracker) {
    self.write_scalar(v, e)
  }
  pub fn write_u16(&mut self, v: u16, e: &mut BinaryIoErrorTracker) {
    self.write_scalar(v, e)
  }
  pub fn write_u32(&mut self, v: u32, e: &mut BinaryIoErrorTracker) {
    self.write_scalar(v, e)
  }
  pub fn write_f32(&mut self, v: f32, e: &mut BinaryIoErrorTracker) {
    self.write_scalar(v, e)
  }
  pub fn write_f64(&mut self, v: f64, e: &mut BinaryIoErrorTracker) {
    self.write_scalar(v, e)
  }

  pub fn flush(&mut self) -> std::io::Result<()> {
    self.stream.flush()
  }
}

/// Fill `buf` completely or report how many bytes arrived.
fn read_fully<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<(), usize> {
  let mut filled = 0usize;
  while filled < buf.len() {
    match stream.read(&mut buf[filled..]) {
      Ok(0) => return Err(filled),
      Ok(n) => filled += n,
      Err(ref err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
      Err(_) => return Err(filled),
    }
  }
  Ok(())
}

#[cfg(test)]
#[path = "binary_io_test.rs"]
mod binary_io_test;
