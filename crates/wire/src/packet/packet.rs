use bytes::{BufMut, Bytes, BytesMut};

use crate::ensure;
use crate::packet::{Pack, PacketError, Unpack};

/// Size of the big-endian payload length header
pub const HEADER_SIZE: usize = 4;

const EMPTY_HEADER: [u8; HEADER_SIZE] = [0; HEADER_SIZE];

/// A cursor-based binary message.
///
/// Writes always append to the end of the payload. Reads advance an
/// independent cursor that starts at the first payload byte and never moves
/// past the end of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    buffer: BytesMut,
    /// absolute offset into `buffer`, always in `HEADER_SIZE..=buffer.len()`
    read_pos: usize,
}

impl Packet {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty packet with room for `capacity` payload bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = BytesMut::with_capacity(HEADER_SIZE + capacity);
        buffer.put_slice(&EMPTY_HEADER);
        Self { buffer, read_pos: HEADER_SIZE }
    }

    /// Creates a packet whose payload is a copy of `payload`.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut packet = Self::with_capacity(payload.len());
        packet.buffer.put_slice(payload);
        packet
    }

    /// Parses a full wire frame, length header included.
    ///
    /// # Errors
    ///
    /// - [`PacketError::OutOfRange`] if `wire` is shorter than the header
    /// - [`PacketError::LengthMismatch`] if the header disagrees with the payload size
    pub fn from_wire(wire: &[u8]) -> Result<Self, PacketError> {
        ensure!(wire.len() >= HEADER_SIZE, PacketError::out_of_range(HEADER_SIZE, wire.len()));

        let declared = read_header(wire);
        let actual = wire.len() - HEADER_SIZE;
        ensure!(declared == actual, PacketError::length_mismatch(declared, actual));

        Ok(Self { buffer: BytesMut::from(wire), read_pos: HEADER_SIZE })
    }

    /// Wraps a frame already split off a stream whose header was validated.
    pub(crate) fn from_frame(frame: BytesMut) -> Self {
        debug_assert!(frame.len() >= HEADER_SIZE);
        Self { buffer: frame, read_pos: HEADER_SIZE }
    }

    /// Appends `value` to the payload.
    pub fn write<T: Pack + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.pack(self);
        self
    }

    /// Reads the next value of type `T` and advances the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`PacketError::OutOfRange`] if fewer bytes remain than `T` needs.
    pub fn read<T: Unpack>(&mut self) -> Result<T, PacketError> {
        T::unpack(self)
    }

    /// Reads the next value into `out`, allowing reads to be chained.
    ///
    /// `out` is left untouched when the read fails.
    pub fn read_into<T: Unpack>(&mut self, out: &mut T) -> Result<&mut Self, PacketError> {
        *out = T::unpack(self)?;
        Ok(self)
    }

    /// Appends a C-like enum as its discriminant, capped at 32 bits.
    pub fn write_enum<E: Into<u32>>(&mut self, value: E) -> &mut Self {
        self.buffer.put_u32(value.into());
        self
    }

    /// Reads a discriminant written by [`write_enum`](Self::write_enum).
    pub fn read_enum<E: TryFrom<u32>>(&mut self) -> Result<E, PacketError> {
        let raw = self.read::<u32>()?;
        E::try_from(raw).map_err(|_e| PacketError::InvalidEnum(raw))
    }

    /// Recomputes the length header and returns the full wire frame.
    ///
    /// The header cannot describe payloads over `u32::MAX` bytes. Writing
    /// one is a caller error; [`PacketCodec`](crate::packet::PacketCodec)
    /// rejects such packets instead of framing them.
    pub fn wire_bytes(&mut self) -> &[u8] {
        self.sync_header();
        &self.buffer
    }

    /// Consumes the packet, returning the full wire frame.
    pub fn into_wire_bytes(mut self) -> Bytes {
        self.sync_header();
        self.buffer.freeze()
    }

    /// Moves the read cursor to `pos`, relative to the first payload byte.
    pub fn reset_read_cursor(&mut self, pos: usize) -> Result<(), PacketError> {
        let len = self.payload_len();
        ensure!(pos <= len, PacketError::out_of_range(pos, len));
        self.read_pos = HEADER_SIZE + pos;
        Ok(())
    }

    /// Moves the read cursor back to the first payload byte.
    pub fn rewind(&mut self) {
        self.read_pos = HEADER_SIZE;
    }

    /// Drops every payload byte, keeping the header slot and allocation.
    pub fn clear(&mut self) {
        self.buffer.truncate(HEADER_SIZE);
        self.buffer[..HEADER_SIZE].copy_from_slice(&EMPTY_HEADER);
        self.read_pos = HEADER_SIZE;
    }

    /// Reserves room for at least `additional` more payload bytes.
    pub fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional);
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer[HEADER_SIZE..]
    }

    pub fn payload_len(&self) -> usize {
        self.buffer.len() - HEADER_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.payload_len() == 0
    }

    /// Number of unread payload bytes.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.read_pos
    }

    /// Read cursor position relative to the first payload byte.
    pub fn read_position(&self) -> usize {
        self.read_pos - HEADER_SIZE
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Consumes the next `len` payload bytes.
    pub(crate) fn take(&mut self, len: usize) -> Result<&[u8], PacketError> {
        let remaining = self.remaining();
        ensure!(len <= remaining, PacketError::out_of_range(len, remaining));

        let start = self.read_pos;
        self.read_pos += len;
        Ok(&self.buffer[start..self.read_pos])
    }

    fn sync_header(&mut self) {
        let len = encoded_len(self.payload_len());
        debug_assert!(len.is_ok(), "packet payload exceeds u32::MAX bytes");
        let len = len.unwrap_or(u32::MAX);
        self.buffer[..HEADER_SIZE].copy_from_slice(&len.to_be_bytes());
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a payload length to its header value.
pub(crate) fn encoded_len(len: usize) -> Result<u32, PacketError> {
    u32::try_from(len).map_err(|_e| PacketError::max_packet_size_exceeded(len, u32::MAX as usize))
}

pub(crate) fn read_header(wire: &[u8]) -> usize {
    let mut header = EMPTY_HEADER;
    header.copy_from_slice(&wire[..HEADER_SIZE]);
    u32::from_be_bytes(header) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red = 1,
        Blue = 2,
    }

    impl From<Color> for u32 {
        fn from(color: Color) -> Self {
            color as u32
        }
    }

    impl TryFrom<u32> for Color {
        type Error = ();

        fn try_from(value: u32) -> Result<Self, Self::Error> {
            match value {
                1 => Ok(Color::Red),
                2 => Ok(Color::Blue),
                _ => Err(()),
            }
        }
    }

    #[test]
    fn new_packet_has_only_header() {
        let mut packet = Packet::new();
        assert!(packet.is_empty());
        assert_eq!(packet.wire_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn mixed_fields_read_back_in_order() {
        let mut packet = Packet::new();
        packet.write(&0xDEAD_BEEFu32).write("hello").write(&(-42i32, String::from("pair")));

        let mut received = Packet::from_wire(packet.wire_bytes()).unwrap();
        assert_eq!(received.read::<u32>().unwrap(), 0xDEAD_BEEF);
        assert_eq!(received.read::<String>().unwrap(), "hello");
        assert_eq!(received.read::<(i32, String)>().unwrap(), (-42, "pair".to_string()));

        let err = received.read::<u8>().unwrap_err();
        assert!(err.is_out_of_range());
    }

    #[test]
    fn wire_format_is_big_endian_with_length_prefix() {
        let mut packet = Packet::new();
        packet.write(&0x0102u16).write("ab");
        assert_eq!(packet.wire_bytes(), &[0, 0, 0, 8, 0x01, 0x02, 0, 0, 0, 2, b'a', b'b']);
    }

    #[test]
    fn every_primitive_survives() {
        let mut packet = Packet::new();
        packet
            .write(&true)
            .write(&0xABu8)
            .write(&-5i8)
            .write(&0xBEEFu16)
            .write(&-300i16)
            .write(&-70_000i32)
            .write(&u64::MAX)
            .write(&i64::MIN)
            .write(&1.5f32)
            .write(&-2.25f64);

        let mut received = Packet::from_wire(packet.wire_bytes()).unwrap();
        assert!(received.read::<bool>().unwrap());
        assert_eq!(received.read::<u8>().unwrap(), 0xAB);
        assert_eq!(received.read::<i8>().unwrap(), -5);
        assert_eq!(received.read::<u16>().unwrap(), 0xBEEF);
        assert_eq!(received.read::<i16>().unwrap(), -300);
        assert_eq!(received.read::<i32>().unwrap(), -70_000);
        assert_eq!(received.read::<u64>().unwrap(), u64::MAX);
        assert_eq!(received.read::<i64>().unwrap(), i64::MIN);
        assert_eq!(received.read::<f32>().unwrap().to_bits(), 1.5f32.to_bits());
        assert_eq!(received.read::<f64>().unwrap().to_bits(), (-2.25f64).to_bits());
        assert_eq!(received.remaining(), 0);
    }

    #[test]
    fn collections_survive() {
        let list = vec![1u16, 2, 3];
        let mut map = HashMap::new();
        map.insert("a".to_string(), 1u32);
        map.insert("b".to_string(), 2u32);
        let mut ordered = BTreeMap::new();
        ordered.insert(3i64, vec!["x".to_string()]);

        let mut packet = Packet::new();
        packet.write(&list).write(&map).write(&ordered);

        let mut received = Packet::from_wire(packet.wire_bytes()).unwrap();
        assert_eq!(received.read::<Vec<u16>>().unwrap(), list);
        assert_eq!(received.read::<HashMap<String, u32>>().unwrap(), map);
        assert_eq!(received.read::<BTreeMap<i64, Vec<String>>>().unwrap(), ordered);
    }

    #[test]
    fn enums_use_discriminant() {
        let mut packet = Packet::new();
        packet.write_enum(Color::Blue).write(&9u32);

        assert_eq!(packet.read_enum::<Color>().unwrap(), Color::Blue);
        assert!(matches!(packet.read_enum::<Color>(), Err(PacketError::InvalidEnum(9))));
    }

    #[test]
    fn read_into_chains_and_preserves_on_failure() {
        let mut packet = Packet::new();
        packet.write(&1u8).write(&2u16);

        let (mut a, mut b, mut c) = (0u8, 0u16, 77u32);
        packet.read_into(&mut a).unwrap().read_into(&mut b).unwrap();
        assert_eq!((a, b), (1, 2));

        assert!(packet.read_into(&mut c).is_err());
        assert_eq!(c, 77);
    }

    #[test]
    fn mismatched_read_is_silent_within_bounds() {
        let mut packet = Packet::new();
        packet.write(&0x0001_0002u32);

        assert_eq!(packet.read::<u16>().unwrap(), 1);
        assert_eq!(packet.read::<u16>().unwrap(), 2);
    }

    #[test]
    fn string_length_past_end_fails() {
        let mut packet = Packet::new();
        packet.write(&100u32).write(&0u8);
        assert!(packet.read::<String>().unwrap_err().is_out_of_range());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut packet = Packet::new();
        packet.write(&vec![0xFFu8, 0xFE]);
        assert!(matches!(packet.read::<String>(), Err(PacketError::InvalidUtf8)));
    }

    #[test]
    fn cursor_controls() {
        let mut packet = Packet::new();
        packet.write(&1u32).write(&2u32);

        assert_eq!(packet.read::<u32>().unwrap(), 1);
        assert_eq!(packet.read_position(), 4);

        packet.rewind();
        assert_eq!(packet.read::<u32>().unwrap(), 1);

        packet.reset_read_cursor(4).unwrap();
        assert_eq!(packet.read::<u32>().unwrap(), 2);

        assert!(packet.reset_read_cursor(9).is_err());
        assert_eq!(packet.read_position(), 8);
    }

    #[test]
    fn clear_keeps_header_slot() {
        let mut packet = Packet::new();
        packet.write("payload");
        packet.reserve(64);
        packet.clear();

        assert!(packet.is_empty());
        assert_eq!(packet.read_position(), 0);
        assert_eq!(packet.wire_bytes(), &[0, 0, 0, 0]);

        packet.write(&5u8);
        assert_eq!(packet.read::<u8>().unwrap(), 5);
    }

    #[test]
    fn from_wire_validates_header() {
        assert!(matches!(Packet::from_wire(&[0, 0]), Err(PacketError::OutOfRange { .. })));
        assert!(matches!(
            Packet::from_wire(&[0, 0, 0, 3, 1]),
            Err(PacketError::LengthMismatch { declared: 3, actual: 1 })
        ));

        let packet = Packet::from_payload(b"\x00\x07");
        let mut received = Packet::from_wire(&packet.into_wire_bytes()).unwrap();
        assert_eq!(received.read::<u16>().unwrap(), 7);
    }

    #[test]
    fn header_length_fits_u32() {
        assert_eq!(encoded_len(5).unwrap(), 5);
        assert_eq!(encoded_len(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn header_length_rejects_oversized_payload() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(
            encoded_len(len),
            Err(PacketError::MaxPacketSizeExceeded { size, max_size }) if size == len && max_size == u32::MAX as usize
        ));
    }
}
