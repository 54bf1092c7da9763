//! Field encodings for [`Packet`].
//!
//! Fixed-width integers and floats are written big-endian. Strings, byte
//! strings and collections carry a `u32` big-endian element count, followed by
//! the elements in order. Pairs are written first-then-second with no framing.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::mem::size_of;

use bytes::{Buf, BufMut, Bytes};

use crate::packet::{Packet, PacketError};

/// A value that can be appended to a [`Packet`].
pub trait Pack {
    fn pack(&self, packet: &mut Packet);
}

/// A value that can be read back from a [`Packet`].
pub trait Unpack: Sized {
    /// # Errors
    ///
    /// Fails with [`PacketError::OutOfRange`] when the payload runs out.
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError>;
}

macro_rules! impl_primitive {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Pack for $ty {
                #[inline]
                fn pack(&self, packet: &mut Packet) {
                    packet.buffer_mut().$put(*self);
                }
            }

            impl Unpack for $ty {
                #[inline]
                fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
                    let mut bytes = packet.take(size_of::<$ty>())?;
                    Ok(bytes.$get())
                }
            }
        )*
    };
}

impl_primitive! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16, get_u16;
    i16 => put_i16, get_i16;
    u32 => put_u32, get_u32;
    i32 => put_i32, get_i32;
    u64 => put_u64, get_u64;
    i64 => put_i64, get_i64;
    f32 => put_f32, get_f32;
    f64 => put_f64, get_f64;
}

impl Pack for bool {
    fn pack(&self, packet: &mut Packet) {
        u8::from(*self).pack(packet);
    }
}

impl Unpack for bool {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        Ok(u8::unpack(packet)? != 0)
    }
}

/// Writes a collection length.
///
/// # Panics
///
/// Panics if `len` does not fit the 32-bit count field.
fn pack_len(len: usize, packet: &mut Packet) {
    let len = u32::try_from(len).expect("collection length exceeds u32::MAX");
    packet.buffer_mut().put_u32(len);
}

fn unpack_len(packet: &mut Packet) -> Result<usize, PacketError> {
    Ok(u32::unpack(packet)? as usize)
}

impl Pack for [u8] {
    fn pack(&self, packet: &mut Packet) {
        pack_len(self.len(), packet);
        packet.buffer_mut().put_slice(self);
    }
}

impl Pack for str {
    fn pack(&self, packet: &mut Packet) {
        self.as_bytes().pack(packet);
    }
}

impl Pack for String {
    fn pack(&self, packet: &mut Packet) {
        self.as_str().pack(packet);
    }
}

impl Unpack for String {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        let len = unpack_len(packet)?;
        let bytes = packet.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_e| PacketError::InvalidUtf8)
    }
}

impl Pack for Bytes {
    fn pack(&self, packet: &mut Packet) {
        self.as_ref().pack(packet);
    }
}

impl Unpack for Bytes {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        let len = unpack_len(packet)?;
        Ok(Bytes::copy_from_slice(packet.take(len)?))
    }
}

impl<T: Pack> Pack for Vec<T> {
    fn pack(&self, packet: &mut Packet) {
        pack_len(self.len(), packet);
        for item in self {
            item.pack(packet);
        }
    }
}

impl<T: Unpack> Unpack for Vec<T> {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        let count = unpack_len(packet)?;
        // the count comes off the wire, never allocate beyond what the payload could hold
        let mut items = Vec::with_capacity(count.min(packet.remaining()));
        for _ in 0..count {
            items.push(T::unpack(packet)?);
        }
        Ok(items)
    }
}

impl<A: Pack, B: Pack> Pack for (A, B) {
    fn pack(&self, packet: &mut Packet) {
        self.0.pack(packet);
        self.1.pack(packet);
    }
}

impl<A: Unpack, B: Unpack> Unpack for (A, B) {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        let first = A::unpack(packet)?;
        let second = B::unpack(packet)?;
        Ok((first, second))
    }
}

impl<K: Pack, V: Pack, S> Pack for HashMap<K, V, S> {
    fn pack(&self, packet: &mut Packet) {
        pack_len(self.len(), packet);
        for (key, value) in self {
            key.pack(packet);
            value.pack(packet);
        }
    }
}

impl<K: Unpack + Eq + Hash, V: Unpack> Unpack for HashMap<K, V> {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        let count = unpack_len(packet)?;
        let mut map = HashMap::with_capacity(count.min(packet.remaining()));
        for _ in 0..count {
            let (key, value) = <(K, V)>::unpack(packet)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: Pack, V: Pack> Pack for BTreeMap<K, V> {
    fn pack(&self, packet: &mut Packet) {
        pack_len(self.len(), packet);
        for (key, value) in self {
            key.pack(packet);
            value.pack(packet);
        }
    }
}

impl<K: Unpack + Ord, V: Unpack> Unpack for BTreeMap<K, V> {
    fn unpack(packet: &mut Packet) -> Result<Self, PacketError> {
        let count = unpack_len(packet)?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let (key, value) = <(K, V)>::unpack(packet)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<T: Pack + ?Sized> Pack for &T {
    fn pack(&self, packet: &mut Packet) {
        (**self).pack(packet);
    }
}
