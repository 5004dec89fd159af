use super::*;
use std::io::Cursor;

#[test]
fn scalars_round_trip_little_endian() {
  let mut bio = BinaryIo::new(Cursor::new(Vec::new()), Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();

  bio.write_u16(0xBEEF, &mut e);
  bio.write_u32(0xDEADBEEF, &mut e);
  bio.write_f32(1.5, &mut e);
  bio.write_f64(-2.25, &mut e);
  assert!(!e.has_error());
  assert_eq!(bio.write_pos(), 2 + 4 + 4 + 8);

  let bytes = bio.into_inner().into_inner();
  // spot-check the layout is little-endian on the wire
  assert_eq!(&bytes[0..2], &[0xEF, 0xBE]);
  assert_eq!(&bytes[2..6], &[0xEF, 0xBE, 0xAD, 0xDE]);

  let mut bio = BinaryIo::new(Cursor::new(bytes), Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();
  let mut a = 0u16;
  let mut b = 0u32;
  let mut c = 0f32;
  let mut d = 0f64;
  bio.read_u16(&mut a, &mut e);
  bio.read_u32(&mut b, &mut e);
  bio.read_f32(&mut c, &mut e);
  bio.read_f64(&mut d, &mut e);

  assert!(!e.has_error());
  assert_eq!(a, 0xBEEF);
  assert_eq!(b, 0xDEADBEEF);
  assert_eq!(c, 1.5);
  assert_eq!(d, -2.25);
  assert_eq!(bio.read_pos(), 18);
}

#[test]
fn big_endian_reverses_bytes() {
  let mut bio = BinaryIo::new(Cursor::new(Vec::new()), Endianness::Big);
  let mut e = BinaryIoErrorTracker::new();
  bio.write_u32(0x01020304, &mut e);

  let bytes = bio.into_inner().into_inner();
  assert_eq!(&bytes, &[0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn short_read_records_first_and_last_error() {
  let mut bio = BinaryIo::new(Cursor::new(vec![0x01, 0x02, 0x03]), Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();

  let mut ok = 0u16;
  bio.read_u16(&mut ok, &mut e);
  assert!(!e.has_error());

  // only one byte left: this read fails but the session continues
  let mut bad = 0u32;
  bio.read_u32(&mut bad, &mut e);
  assert!(e.has_error());
  assert_eq!(bad, 0);
  assert_eq!(e.first_error.expected_bytes, 4);
  assert_eq!(e.first_error.actual_bytes, 1);
  assert_eq!(e.first_error.position, 2);
  assert_eq!(e.first_error.direction, IoDirection::Read);

  // a second failure updates last_error but not first_error
  let mut bad2 = 0u16;
  bio.read_u16(&mut bad2, &mut e);
  assert_eq!(e.first_error.type_name, Some("u32"));
  assert_eq!(e.last_error.type_name, Some("u16"));
}

#[test]
fn array_round_trip_and_truncation() {
  let mut bio = BinaryIo::new(Cursor::new(Vec::new()), Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();
  bio.write_array::<u16>(&[1, 2, 3, 4], &mut e);

  let bytes = bio.into_inner().into_inner();
  let mut bio = BinaryIo::new(Cursor::new(bytes), Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();

  let values: Vec<u16> = bio.read_array(4, &mut e);
  assert_eq!(values, vec![1, 2, 3, 4]);
  assert!(!e.has_error());

  // asking for more truncates and flags the tracker
  let mut bio = BinaryIo::new(Cursor::new(vec![0xAA, 0xBB, 0xCC]), Endianness::Little);
  let values: Vec<u16> = bio.read_array(4, &mut e);
  assert_eq!(values, vec![0xBBAA]);
  assert!(e.has_error());
}

#[test]
fn skip_advances_the_read_cursor() {
  let mut bio = BinaryIo::new(
    Cursor::new(vec![0xCA, 0xCA, 0xCA, 0x2A, 0x00]),
    Endianness::Little,
  );
  let mut e = BinaryIoErrorTracker::new();

  bio.read_skip(3, &mut e);
  let mut v = 0u16;
  bio.read_u16(&mut v, &mut e);

  assert!(!e.has_error());
  assert_eq!(v, 42);
  assert_eq!(bio.read_pos(), 5);
}

#[test]
fn endianness_host_matches_platform() {
  #[cfg(target_endian = "little")]
  assert_eq!(Endianness::host(), Endianness::Little);
  #[cfg(target_endian = "big")]
  assert_eq!(Endianness::host(), Endianness::Big);
}
