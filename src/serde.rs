//! Serde support, enabled by the `serde` feature.
//!
//! The vector types and [`List`] serialize as sequences, so they are
//! interchangeable with `Vec` on the wire. [`BigInt`] serializes as its
//! decimal string, since arbitrary precision does not fit the numeric
//! data model.

use core::fmt;
use core::marker::PhantomData;

use alloc::string::String;
use alloc::string::ToString;
use alloc::vec::Vec;

use serde::de::{Deserialize, Deserializer, Error, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::{BigInt, DynVec, List, SocowVec};

impl<T: Serialize, const N: usize> Serialize for SocowVec<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

struct SocowVecVisitor<T, const N: usize>(PhantomData<T>);

impl<'de, T: Deserialize<'de>, const N: usize> Visitor<'de> for SocowVecVisitor<T, N> {
    type Value = SocowVec<T, N>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        // Collected first and moved in whole, so `T: Clone` is not needed.
        let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element()? {
            buf.push(item);
        }
        Ok(SocowVec::from(buf))
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for SocowVec<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(SocowVecVisitor(PhantomData))
    }
}

impl<T: Serialize> Serialize for DynVec<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

struct DynVecVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for DynVecVisitor<T> {
    type Value = DynVec<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut vec = DynVec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element()? {
            vec.push(item);
        }
        Ok(vec)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for DynVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(DynVecVisitor(PhantomData))
    }
}

impl<T: Serialize> Serialize for List<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

struct ListVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for ListVisitor<T> {
    type Value = List<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut list = List::new();
        while let Some(item) = seq.next_element()? {
            list.push_back(item);
        }
        Ok(list)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for List<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(ListVisitor(PhantomData))
    }
}

impl Serialize for BigInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct BigIntVisitor;

impl Visitor<'_> for BigIntVisitor {
    type Value = BigInt;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a decimal integer string")
    }

    fn visit_str<E: Error>(self, value: &str) -> Result<BigInt, E> {
        value.parse().map_err(Error::custom)
    }

    fn visit_string<E: Error>(self, value: String) -> Result<BigInt, E> {
        self.visit_str(&value)
    }
}

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(BigIntVisitor)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BigInt, DynVec, List, SocowVec};

    #[test]
    fn socow_vec_round_trip() {
        let vec: SocowVec<i32, 4> = crate::socowvec![1, 2, 3, 4, 5];
        let json = serde_json::to_string(&vec).unwrap();
        assert_eq!(json, "[1,2,3,4,5]");
        let back: SocowVec<i32, 4> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec);
    }

    #[test]
    fn socow_vec_of_non_clone_values() {
        #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Opaque {
            id: u32,
        }
        let json = r#"[{"id":1},{"id":2}]"#;
        let vec: SocowVec<Opaque, 2> = serde_json::from_str(json).unwrap();
        assert_eq!(vec.len(), 2);
        assert_eq!(vec[1], Opaque { id: 2 });
    }

    #[test]
    fn dyn_vec_round_trip() {
        let vec: DynVec<&str> = crate::dynvec!["a", "b"];
        let json = serde_json::to_string(&vec).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
        let back: DynVec<alloc::string::String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], "a");
    }

    #[test]
    fn list_round_trip() {
        let list: List<i32> = (1..=3).collect();
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: List<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn bigint_as_decimal_string() {
        let value: BigInt = "-123456789012345678901234567890".parse().unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"-123456789012345678901234567890\"");
        let back: BigInt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
        assert!(serde_json::from_str::<BigInt>("\"12x\"").is_err());
    }
}
